//! Prompts for the extraction and generation calls.
//!
//! Everything the model is told lives here so the wording can change without
//! touching the request plumbing in [`crate::pipeline::llm`], and so tests can
//! inspect the exact instructions without a live provider.

use crate::booking::{BookingRecord, PaymentStatus};

/// Hotel name the confirmation must carry.
pub const HOTEL_NAME: &str = "The Planters House";
/// Reservations phone number as printed on confirmations.
pub const HOTEL_PHONE: &str = "+94 77 683 6955";
/// Reservations mailbox.
pub const HOTEL_EMAIL: &str = "reservations@theplantershouse.com";
/// Public website.
pub const HOTEL_WEBSITE: &str = "www.theplantershouse.com";
/// Deep tea green used for headers and borders.
pub const BRAND_GREEN: &str = "#264b3a";
/// Header typeface.
pub const HEADER_FONT: &str = "Playfair Display";
/// Legacy yellow backgrounds the date block must never use.
pub const FORBIDDEN_BACKGROUNDS: &[&str] = &["#fff8e1", "#fff9e6", "#fff3cd"];

/// Output schema and detection rules shared by image and text extraction.
const EXTRACTION_SCHEMA: &str = r#"Extract ALL booking information and return it as a JSON object with these exact fields:

{
  "booking_type": "direct|agent",
  "guest_name": "Full guest name",
  "email": "Guest email address",
  "phone": "Guest phone number with country code",
  "mobile": "Guest mobile number (if different from phone, otherwise same as phone)",
  "primary_contact": "Primary contact person name (if specified, otherwise same as guest_name)",
  "nationality": "Guest nationality (if available, otherwise 'Not specified')",
  "res_id": "Reservation ID number",
  "check_in": "Check-in date in DD/MM/YYYY format",
  "check_out": "Check-out date in DD/MM/YYYY format",
  "nights": "Number of nights (as number)",
  "rooms": [
    {
      "room_name": "Room/suite name",
      "adults": "Number of adults (as number)",
      "children": "Number of children (as number)",
      "rate_per_night": "Per night rate (number only)",
      "total_rate": "Total for this room (number only)"
    }
  ],
  "total_amount": "Grand total for all rooms (number only, no currency)",
  "deposit_amount": "Deposit required (number only)",
  "amount_paid": "Amount already paid (number only)",
  "balance_due": "Balance remaining (number only)",
  "reserved_date": "Date booking was made (if available)",
  "booking_via": "Booking source - look for 'Travel Agent' field (e.g., 'Direct', 'Booking.com', 'Expedia')",
  "heard_about": "Marketing source - look for 'How did you hear about us?' field (e.g., 'TBC', 'Google', 'Referral')",
  "agent_info": {
    "agent_name": "Agent/company name (if agent booking)",
    "agent_contact": "Agent contact person (if applicable)",
    "agent_email": "Agent email (if applicable)",
    "tour_reference": "Tour reference number (if applicable)",
    "voucher_number": "Voucher number (if applicable)"
  }
}

IMPORTANT DETECTION RULES:
1. BOOKING TYPE:
   - Set to "agent" if you find: agent name, tour operator, travel agency, voucher number, or tour reference
   - Set to "direct" otherwise

2. MULTI-ROOM DETECTION:
   - If multiple rooms listed with separate rates, create separate entries in rooms array
   - Each room gets its own object with name, adults, children, and rates
   - Grand total_amount is sum of all room totals

3. AGENT INFO:
   - Only populate agent_info if booking_type is "agent"
   - Leave fields as null or empty if not applicable

4. DATA INFERENCE:
   - Return ONLY valid JSON, no markdown formatting
   - Calculate nights from dates if not shown
   - If deposit not specified, use 50% of total
   - All monetary values should be numbers without currency symbols
   - Infer booking_via from email domain or explicit mentions"#;

/// Instruction sent after the page images of a scanned booking PDF.
pub fn extraction_prompt_for_images() -> String {
    format!("You are analyzing a Cloudbeds booking confirmation PDF.\n{EXTRACTION_SCHEMA}")
}

/// Instruction for a booking supplied as text (Word document, .txt, or pasted).
pub fn extraction_prompt_for_text(document_text: &str) -> String {
    format!(
        "You are analyzing the text of a hotel booking confirmation.\n\
{EXTRACTION_SCHEMA}\n\nBOOKING TEXT:\n\"\"\"\n{document_text}\n\"\"\""
    )
}

/// Fixed brand and layout rules for every confirmation.
pub const DESIGN_RULES: &str = r#"
CRITICAL DESIGN CONSTRAINTS (must follow exactly):

1. BRANDING (MUST USE EXACT DETAILS):
   - Hotel Name: "The Planters House"
   - Logo: planters-logo.png (65px width)
   - Address: Monarakanda Estate, Koslanda, Sri Lanka
   - Phone: +94 77 683 6955
   - Email: reservations@theplantershouse.com
   - Website: www.theplantershouse.com
   - DO NOT include VAT numbers or UK details

2. A4 PAGE FITTING:
   - Container max-width: 760px
   - Logo width: 65px
   - Scale: 95% for perfect A4 fit
   - Line-height: 1.3
   - For 2-3 rooms: reduce padding to maintain A4 fit

3. LAYOUT STRUCTURE:
   - Two-column grid for guest/booking info (NOT three columns)
   - Side-by-side pricing and payment sections
   - For multi-room: show check-in/check-out dates once in the date grid (don't repeat per room)
   - For multi-room: compact room cards with 3 columns (Adults | Children | Rate/Night)

4. COLOUR PALETTE (Tea Estate Theme):
   - Primary headers and borders: #264b3a (deep tea green)
   - Accent backgrounds for payment boxes: #f6f1e9 (warm cream)
   - Inclusion/information boxes background: #9caf88 (sage)
   - Gold highlights and accents: #b89b5e (muted gold)
   - Information box text: #ffffff (white for contrast on sage)
   - Body text: #6b6b6b (soft grey) on white backgrounds
   - Body text: #333333 (dark grey) ONLY on cream #f6f1e9 backgrounds for higher contrast
   - White backgrounds: #ffffff

   Payment Status Colors:
   - Unpaid (balance = total): #f6f1e9 background, #b89b5e border
   - Partial payment (0 < balance < total): #f6f1e9 background, #b89b5e border
   - Fully paid (balance = 0): #9caf88 background, #264b3a border

5. TYPOGRAPHY (Brand Compliance):
   - Headers: Playfair Display (serif, elegant) - Google Fonts
   - Body: System sans-serif stack (NO web fonts for body)
   - Body font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif
   - Import ONLY Playfair Display from Google Fonts
   - DO NOT import Source Sans Pro or any other body text fonts

6. BOOKING TYPE-SPECIFIC LAYOUTS:

   A. DIRECT BOOKINGS (booking_type = "direct"):
      - Guest info (left) | Booking Information (right)
      - Guest info MUST include: Name, Email, Phone, Mobile (if different), Nationality
      - Booking Information MUST include: Reserved On (reserved_date), Booking Via (booking_via), Reference (heard_about), Contact (+94 77 683 6955), Email (reservations@theplantershouse.com)
      - Standard payment status section
      - Check-in/check-out times in footer

   B. AGENT BOOKINGS (booking_type = "agent"):
      - Guest info (left) | Agent info (right)
      - Guest info MUST include: Name, Email, Phone, Nationality
      - Agent info includes: agent name, contact, email, tour reference, voucher number
      - Billing status section instead of payment status
      - Use sage box styling for agent section

7. MULTI-ROOM HANDLING (if rooms array has 2-3 items):
   - Show dates ONCE in three-column date grid (see DATE DISPLAY section)
   - Each room gets compact card: Room name + total | Adults | Children | Rate/Night
   - Pricing section lists all rooms separately
   - Reduce spacing/padding to fit on A4

8. STYLES:
   - All CSS inline (no external stylesheets)
   - No JavaScript
   - Professional letter spacing for uppercase text
   - Minimal padding/margins for A4 fit

9. FOOTER (exactly two lines):
   Line 1: "Please review our cancellation policy and payment terms above."
   Line 2: "The Planters House | +94 (0)77 683 6955 | reservations@theplantershouse.com | www.theplantershouse.com"

10. INFORMATION BOXES:
   Important policies and information should use sage-colored boxes:
   - Background: #9caf88 (sage)
   - Border-left: 3px solid #264b3a (deep tea green)
   - Text color: #ffffff (white for contrast)
   - Padding: 12px 16px
   - Border-radius: 4px
   - Margin-bottom: 12px
   - No bullet points - use paragraph format within divs
   - Each policy item is a separate box

11. DATE DISPLAY (Three-Column Grid - REQUIRED):
   Use a three-column table/grid layout for check-in/check-out dates:

   Structure: Check-in | Check-out | Nights

   CSS Grid Implementation:
   - Container: display: grid; grid-template-columns: 1fr 1fr 1fr;
   - Border: 1px solid #e0e0e0

   Header Row Styling:
   - Background: #9caf88 (sage)
   - Text color: #264b3a (deep tea green)
   - Font-weight: bold
   - Padding: 10px
   - Border-bottom: 2px solid #264b3a
   - Text-align: center

   Data Row Styling:
   - Background: #ffffff (white)
   - Text color: #333333 (dark grey)
   - Padding: 12px
   - Text-align: center
   - Border-right: 1px solid #e0e0e0 (between columns)

   Date Format: DD/MM/YYYY (e.g., 25/11/2025)

   FORBIDDEN:
   - Yellow background boxes (#fff8e1, #fff9e6, #fff3cd)
   - Four-item horizontal layouts with arrows
   - Single-line date ranges with pipe separators
   - Any layout other than three-column grid
"#;

/// Closing output requirements appended to every generation prompt.
const OUTPUT_REQUIREMENTS: &str = r#"REQUIREMENTS:
1. Return ONLY the complete HTML (<!DOCTYPE html> to </html>)
2. No markdown code blocks or explanations
3. All CSS must be inline
4. Font imports: Import ONLY Playfair Display from Google Fonts
   Example: <link href="https://fonts.googleapis.com/css2?family=Playfair+Display:wght@400;700&display=swap" rel="stylesheet">
   DO NOT import Source Sans Pro or any other body text fonts
5. Logo path: "planters-logo.png" (NOT ../../planters-logo.png)
6. Hotel branding MUST be: "The Planters House" (NOT Planters Country Hotel)
7. Contact details MUST be: +94 77 683 6955, reservations@theplantershouse.com, www.theplantershouse.com
8. Must fit on single A4 page when printed at 95% scale
9. Apply correct payment/billing status color based on balance_due
10. Format dates nicely (e.g., "Monday, 25 November 2025")
11. Calculate balance due date as 14 days before check-in
12. For agent bookings: use sage billing section, include agent fields
13. For multi-room bookings: use compact layout, show dates once in three-column grid
14. Include all design constraints above
15. Footer contact line format: "reservations@theplantershouse.com | +94 77 683 6955 | www.theplantershouse.com"
16. Body text MUST use system sans-serif stack (not web fonts)
17. Date display MUST use three-column grid with sage header (not yellow boxes or horizontal layout)
18. Body text color: #6b6b6b on white backgrounds, #333333 on cream #f6f1e9 backgrounds only

Generate the complete HTML now:"#;

/// Instructions that depend on booking type and room count.
///
/// Empty for a single-room direct booking.
pub fn scenario_instructions(record: &BookingRecord) -> String {
    let mut out = String::new();
    let layout = record.layout();

    if record.is_agent() {
        let agent = record
            .agent_info
            .as_ref()
            .and_then(|a| serde_json::to_string(a).ok())
            .unwrap_or_else(|| "{}".to_string());
        out.push_str(&format!(
            "
AGENT BOOKING INSTRUCTIONS:
- This is an AGENT booking for a tour operator or travel agency
- Include agent information section with: {agent}
- Use sage box styling for agent section: #9caf88 background, #264b3a border-left, #ffffff text
- Agent section should include: Agent Company, Contact Person, Tour Reference, Agent Email
- Position agent section after guest details, before room details
- Use billing status section instead of payment status (same sage styling)
"
        ));
    }

    if layout.is_multi_room() {
        let n = layout.room_count;
        out.push_str(&format!(
            "
MULTI-ROOM BOOKING INSTRUCTIONS:
- This booking has {n} rooms
- Show check-in/check-out dates ONCE in three-column date grid (NOT yellow box)
- Create separate compact cards for each room
- List all {n} rooms in pricing breakdown
- Ensure everything fits on single A4 page (reduce padding if needed)
"
        ));
    }

    out
}

/// Values worked out from the record so the model does not have to.
pub fn computed_hints(record: &BookingRecord) -> String {
    let mut lines = Vec::new();

    if let Some(status) = record.payment_status() {
        let section = if record.is_agent() { "billing" } else { "payment" };
        let colours = match status {
            PaymentStatus::FullyPaid => "#9caf88 background, #264b3a border",
            PaymentStatus::Unpaid | PaymentStatus::Partial => "#f6f1e9 background, #b89b5e border",
        };
        lines.push(format!(
            "- {section} status: {} ({colours})",
            status.label()
        ));
    }
    if let Some(balance) = record.effective_balance() {
        lines.push(format!("- balance due: {balance:.2}"));
    }
    if let Some(nights) = record.stay_nights() {
        lines.push(format!("- nights: {nights}"));
    }
    if let Some(due) = record.balance_due_date() {
        lines.push(format!("- balance due date: {due}"));
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("\nCOMPUTED VALUES (use exactly as given):\n{}\n", lines.join("\n"))
    }
}

/// Full generation prompt for a booking record.
pub fn generation_prompt(record: &BookingRecord) -> String {
    let data = serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Generate a complete, self-contained HTML file for a hotel booking confirmation using this data:\n\n\
{data}\n\n{DESIGN_RULES}\n\n{scenario}{hints}\n\n{OUTPUT_REQUIREMENTS}",
        scenario = scenario_instructions(record),
        hints = computed_hints(record),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> BookingRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_prompt_embeds_document() {
        let p = extraction_prompt_for_text("Reservation 991 for Ada Lovelace");
        assert!(p.contains("Reservation 991 for Ada Lovelace"));
        assert!(p.contains("\"booking_type\": \"direct|agent\""));
        assert!(p.contains("use 50% of total"));
    }

    #[test]
    fn single_room_direct_has_no_scenario_block() {
        let r = record(json!({"rooms": [{"room_name": "Tea Suite"}]}));
        assert!(scenario_instructions(&r).is_empty());
    }

    #[test]
    fn agent_and_multi_room_are_independent() {
        let r = record(json!({
            "booking_type": "agent",
            "agent_info": {"agent_name": "Lanka Tours", "voucher_number": "V-77"},
            "rooms": [{}, {}, {}]
        }));
        let s = scenario_instructions(&r);
        assert!(s.contains("AGENT BOOKING INSTRUCTIONS"));
        assert!(s.contains("Lanka Tours"));
        assert!(s.contains("MULTI-ROOM BOOKING INSTRUCTIONS"));
        assert!(s.contains("This booking has 3 rooms"));

        let agent_only = record(json!({"booking_type": "agent", "rooms": [{}]}));
        let s = scenario_instructions(&agent_only);
        assert!(s.contains("AGENT BOOKING"));
        assert!(!s.contains("MULTI-ROOM"));
    }

    #[test]
    fn fully_paid_hint_for_settled_booking() {
        let r = record(json!({"total_amount": 500, "amount_paid": 500, "rooms": [{}, {}]}));
        let hints = computed_hints(&r);
        assert!(hints.contains("payment status: FULLY PAID"), "got: {hints}");
        assert!(!hints.contains("UNPAID"));
    }

    #[test]
    fn agent_hint_names_billing_section() {
        let r = record(json!({"booking_type": "agent", "total_amount": 300, "amount_paid": 0}));
        assert!(computed_hints(&r).contains("billing status: UNPAID"));
    }

    #[test]
    fn generation_prompt_carries_record_and_rules() {
        let r = record(json!({"res_id": "R123", "guest_name": "Ada"}));
        let p = generation_prompt(&r);
        assert!(p.contains("\"res_id\": \"R123\""));
        assert!(p.contains("CRITICAL DESIGN CONSTRAINTS"));
        assert!(p.ends_with("Generate the complete HTML now:"));
    }
}
