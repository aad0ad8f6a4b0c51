//! Scan-code purchase message builder
//!
//! Assembles the 0200 purchase request a terminal sends when the cashier
//! scans a payment code. The MAC (field 64) is attached separately by the
//! client once every other field is final.

use iso8583_core::{FieldValue, Iso8583Error, Iso8583Result, Message};

/// Tag opening the extended-order record in field 57.
const EXT_ORDER_TAG: &str = "UPLDC2";

/// Builder for a scan-code purchase (MTI 0200) request.
#[derive(Debug, Clone)]
pub struct ScanPurchaseBuilder {
    tpdu: String,
    header: String,
    amount: String,
    trace_number: String,
    batch_number: String,
    terminal_id: String,
    merchant_id: String,
    scan_code: String,
    ext_order: Option<String>,
    currency: String,
}

impl ScanPurchaseBuilder {
    /// Start a builder for the given terminal and merchant.
    pub fn new(terminal_id: &str, merchant_id: &str) -> Self {
        Self {
            tpdu: "6004010000".to_string(),
            header: "602200000000".to_string(),
            amount: String::new(),
            trace_number: String::new(),
            batch_number: String::new(),
            terminal_id: terminal_id.to_string(),
            merchant_id: merchant_id.to_string(),
            scan_code: String::new(),
            ext_order: None,
            currency: "156".to_string(),
        }
    }

    /// Override the TPDU (defaults to the acquirer route 6004010000).
    pub fn tpdu(mut self, tpdu: &str) -> Self {
        self.tpdu = tpdu.to_string();
        self
    }

    /// Transaction amount in minor units, up to 12 digits.
    pub fn amount(mut self, amount: &str) -> Self {
        self.amount = amount.to_string();
        self
    }

    /// System trace audit number (field 11), 6 digits.
    pub fn trace_number(mut self, trace_number: &str) -> Self {
        self.trace_number = trace_number.to_string();
        self
    }

    /// Settlement batch number carried in field 60.2, 6 digits.
    pub fn batch_number(mut self, batch_number: &str) -> Self {
        self.batch_number = batch_number.to_string();
        self
    }

    /// Scanned payment code (field 62).
    pub fn scan_code(mut self, scan_code: &str) -> Self {
        self.scan_code = scan_code.to_string();
        self
    }

    /// Optional external order id, carried as a tagged record in field 57.
    pub fn ext_order(mut self, ext_order: &str) -> Self {
        self.ext_order = Some(ext_order.to_string());
        self
    }

    /// Currency code for field 49 (defaults to 156, CNY).
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    /// Build the purchase request message.
    pub fn build(&self) -> Iso8583Result<Message> {
        if self.scan_code.is_empty() {
            return Err(Iso8583Error::MissingField(62));
        }
        let mut msg = Message::new(&self.tpdu, "0200");
        msg.header = Some(self.header.clone());
        msg.set_field(3, "000000"); // processing code: purchase
        msg.set_field(4, self.amount.as_str());
        msg.set_field(11, self.trace_number.as_str());
        msg.set_field(22, "040"); // entry mode: scanned code
        msg.set_field(23, "001");
        msg.set_field(25, "31"); // condition code: scan-code purchase
        msg.set_field(41, self.terminal_id.as_str());
        msg.set_field(42, self.merchant_id.as_str());
        msg.set_field(49, self.currency.as_str());
        if let Some(ext_order) = &self.ext_order {
            msg.set_field(
                57,
                format!("{}{:03}{}", EXT_ORDER_TAG, ext_order.len(), ext_order),
            );
        }
        msg.set_field(
            60,
            FieldValue::Composite(vec![
                FieldValue::Scalar("00".to_string()),
                FieldValue::Scalar(self.batch_number.clone()),
                FieldValue::Scalar("003".to_string()),
                FieldValue::Scalar("0".to_string()),
                FieldValue::Scalar("0".to_string()),
            ]),
        );
        msg.set_field(62, self.scan_code.as_str());
        Ok(msg)
    }
}
