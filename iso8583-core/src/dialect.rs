//! The POS terminal protocol dialect
//!
//! The field-definition table is a process-wide constant: it must be
//! identical on both communicating peers to interoperate. Field 1 is
//! reserved as the secondary-bitmap indicator and never appears here;
//! field 64 is the MAC slot.

use crate::field::{ByteEncoding, FieldDefinition, FieldKind};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Map from field index to its definition.
pub type FieldTable = BTreeMap<usize, FieldDefinition>;

static TERMINAL_DIALECT: Lazy<FieldTable> = Lazy::new(|| {
    use ByteEncoding::{Ascii, Bcd, Binary, RBcd};
    use FieldKind::{Var1, Var2};

    let mut t = FieldTable::new();
    t.insert(2, FieldDefinition::var(Var1, Bcd)); // primary account number
    t.insert(3, FieldDefinition::fixed(Bcd, 6)); // processing code
    t.insert(4, FieldDefinition::fixed(Bcd, 12)); // amount
    t.insert(6, FieldDefinition::fixed(Bcd, 12));
    t.insert(10, FieldDefinition::fixed(Bcd, 8));
    t.insert(11, FieldDefinition::fixed(Bcd, 6)); // system trace number
    t.insert(12, FieldDefinition::fixed(Bcd, 6));
    t.insert(13, FieldDefinition::fixed(Bcd, 4));
    t.insert(14, FieldDefinition::fixed(Bcd, 4)); // card expiration
    t.insert(15, FieldDefinition::fixed(Bcd, 4));
    t.insert(22, FieldDefinition::fixed(Bcd, 3)); // POS entry mode
    t.insert(23, FieldDefinition::fixed(RBcd, 3)); // card sequence number
    t.insert(25, FieldDefinition::fixed(Bcd, 2)); // POS condition code
    t.insert(26, FieldDefinition::fixed(Bcd, 2));
    t.insert(32, FieldDefinition::var(Var1, Bcd));
    t.insert(35, FieldDefinition::var(Var1, Bcd)); // track 2 data
    t.insert(37, FieldDefinition::fixed(Ascii, 12)); // retrieval reference number
    t.insert(38, FieldDefinition::fixed(Ascii, 6)); // auth id response
    t.insert(39, FieldDefinition::fixed(Ascii, 2)); // response code
    t.insert(41, FieldDefinition::fixed(Ascii, 8)); // terminal id
    t.insert(42, FieldDefinition::fixed(Ascii, 15)); // merchant id
    t.insert(44, FieldDefinition::var(Var1, Bcd));
    t.insert(46, FieldDefinition::var(Var2, Bcd));
    t.insert(48, FieldDefinition::var(Var2, Bcd));
    t.insert(49, FieldDefinition::fixed(Ascii, 3)); // currency code
    t.insert(51, FieldDefinition::fixed(Ascii, 3));
    t.insert(52, FieldDefinition::fixed(Binary, 8)); // PIN block
    t.insert(53, FieldDefinition::fixed(Bcd, 16));
    t.insert(54, FieldDefinition::var(Var2, Ascii));
    t.insert(55, FieldDefinition::var(Var2, Binary)); // ICC data
    t.insert(57, FieldDefinition::var(Var2, Ascii)); // extended order data
    t.insert(
        60, // terminal transaction info
        FieldDefinition::composite(
            Var2,
            Bcd,
            vec![
                FieldDefinition::fixed(Bcd, 2),
                FieldDefinition::fixed(Bcd, 6), // batch number
                FieldDefinition::fixed(Bcd, 3),
                FieldDefinition::fixed(Bcd, 1),
                FieldDefinition::fixed(Bcd, 1),
            ],
        ),
    );
    t.insert(
        61,
        FieldDefinition::composite(
            Var2,
            Bcd,
            vec![
                FieldDefinition::fixed(Bcd, 6),
                FieldDefinition::fixed(Bcd, 6),
                FieldDefinition::fixed(Bcd, 4),
            ],
        ),
    );
    t.insert(62, FieldDefinition::var(Var2, Binary)); // scan code data
    t.insert(
        63,
        FieldDefinition::composite(Var2, Bcd, vec![FieldDefinition::fixed(Bcd, 3)]),
    );
    t.insert(64, FieldDefinition::fixed(Binary, 8)); // MAC
    t
});

/// The constant field table of the POS terminal dialect.
pub fn terminal_dialect() -> &'static FieldTable {
    &TERMINAL_DIALECT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_reserved_slots() {
        let table = terminal_dialect();
        assert!(!table.contains_key(&1));
        let mac = &table[&64];
        assert_eq!(mac.kind, FieldKind::Fixed);
        assert_eq!(mac.encoding, ByteEncoding::Binary);
        assert_eq!(mac.length, 8);
    }

    #[test]
    fn test_dialect_composite_layouts() {
        let table = terminal_dialect();
        let f60 = &table[&60];
        let subs = f60.sub_fields.as_ref().unwrap();
        assert_eq!(subs.len(), 5);
        assert_eq!(subs.iter().map(|s| s.length).sum::<usize>(), 13);
        assert!(subs.iter().all(|s| s.kind == FieldKind::Fixed));
    }
}
