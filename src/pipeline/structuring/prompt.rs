use serde_json::{json, Value};

/// Model used when none is configured.
pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-3-flash-preview";

/// Keys the model must return, in schema order.
pub const REQUIRED_RESPONSE_KEYS: &[&str] = &[
    "customerName",
    "phoneNumber",
    "deliveryAddress",
    "totalPrice",
    "note",
];

/// Keys the model may return.
pub const ALLOWED_RESPONSE_KEYS: &[&str] = &[
    "customerName",
    "phoneNumber",
    "deliveryAddress",
    "totalPrice",
    "items",
    "note",
];

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You are an order processing assistant for small online merchants. Your ONLY
role is to read a customer chat transcript and extract the order it describes:
customer name, phone number, delivery address, total price, items and notes.
The chat may be in English, Bengali, or a mix of both written in Latin
letters (Banglish).

RULES (ABSOLUTE, NO EXCEPTIONS):
1. Extract ONLY information explicitly stated in the chat. If a field is not
   clearly present, return null for it. NEVER guess, infer or fill defaults.
2. PRICE: set totalPrice ONLY when the chat states an amount with currency or
   payment language (e.g. "500tk", "1200 taka", "৳300", "price is 200",
   "total 1000", "bill 50", "dam 450"). Otherwise totalPrice MUST be null.
3. Numbers inside addresses ("House 24/1", "Road 5", "Sector 7") or phone
   numbers ("017...", "+880...") are NEVER prices. If those are the only
   numbers in the chat, totalPrice MUST be null.
4. NEVER use placeholder values such as 0, 65 or any other number when no
   amount is clearly stated.
5. Copy names, phone numbers and addresses as written; do not translate them.

Output MUST be a single JSON object with exactly these fields:
customerName, phoneNumber, deliveryAddress, totalPrice, items, note.
"#;

/// Build the user prompt for one chat transcript.
pub fn build_extraction_prompt(chat_text: &str) -> String {
    format!(
        r#"Extract the order details from the following customer chat.

<chat>
{chat_text}
</chat>

Return JSON only, using null for anything not stated in the chat:

{{
  "customerName": "name or null",
  "phoneNumber": "phone or null",
  "deliveryAddress": "address or null",
  "totalPrice": "number or null",
  "items": "items or null",
  "note": "note or null"
}}
"#
    )
}

/// Response schema sent with the request so the service returns the
/// order shape directly.
pub fn extraction_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "customerName": {
                "type": "STRING",
                "nullable": true,
                "description": "Extracted name or null"
            },
            "phoneNumber": {
                "type": "STRING",
                "nullable": true,
                "description": "Extracted phone or null"
            },
            "deliveryAddress": {
                "type": "STRING",
                "nullable": true,
                "description": "Extracted address or null"
            },
            "totalPrice": {
                "type": "NUMBER",
                "nullable": true,
                "description": "Numeric total price. MUST BE null if not found."
            },
            "items": {
                "type": "STRING",
                "nullable": true,
                "description": "Items or null"
            },
            "note": {
                "type": "STRING",
                "nullable": true,
                "description": "Notes or null"
            }
        },
        "required": REQUIRED_RESPONSE_KEYS
    })
}
