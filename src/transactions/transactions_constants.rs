/// Wire strings for the normalized action enum (§ input record schema)
pub const ACTION_TYPE_BUY: &str = "BUY";
pub const ACTION_TYPE_SELL: &str = "SELL";
pub const ACTION_TYPE_DIVIDEND: &str = "DIVIDEND";
pub const ACTION_TYPE_WHT: &str = "TAX_WHT";
pub const ACTION_TYPE_FEE: &str = "FEE";
pub const ACTION_TYPE_CORPORATE_ACTION: &str = "CORP";
