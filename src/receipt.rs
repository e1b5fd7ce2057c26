use chrono::{Local, NaiveDate, NaiveTime, Timelike, Utc};
use rand::Rng;

use crate::db::models::Donation;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    digits.reverse();
    digits.into_iter().collect()
}

/// `NM` + current millis in base 36 + 5 random base-36 characters, all
/// upper-cased. The timestamp prefix keeps ids from one device roughly
/// monotonic; uniqueness is probabilistic and nothing enforces it.
pub fn generate_receipt_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| BASE36[rng.gen_range(0..36)] as char)
        .collect();
    format!("NM{}{}", to_base36(millis), suffix).to_uppercase()
}

/// Display form only; the stored YYYY-MM-DD value is never mutated.
pub fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%d %b %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// 24-hour HH:MM:SS to 12-hour with AM/PM, hour unpadded.
pub fn format_time(time: &str) -> String {
    match NaiveTime::parse_from_str(time, "%H:%M:%S") {
        Ok(t) => {
            let (is_pm, hour) = t.hour12();
            format!(
                "{}:{:02} {}",
                hour,
                t.minute(),
                if is_pm { "PM" } else { "AM" }
            )
        }
        Err(_) => time.to_string(),
    }
}

/// Literal rupee symbol and the raw numeric amount: no grouping, no forced
/// decimal places.
pub fn format_currency(amount: f64) -> String {
    format!("₹{}", amount)
}

const RECEIPT_STYLE: &str = r#"
    body {
      font-family: 'Arial', sans-serif;
      margin: 0;
      padding: 20px;
      background-color: #f5f5f5;
    }
    .receipt {
      background: white;
      max-width: 400px;
      margin: 0 auto;
      padding: 30px;
      border-radius: 12px;
      box-shadow: 0 4px 12px rgba(0,0,0,0.1);
      border: 2px solid #FF6B35;
    }
    .header {
      text-align: center;
      border-bottom: 3px solid #FF6B35;
      padding-bottom: 20px;
      margin-bottom: 25px;
    }
    .mandal-name {
      font-size: 24px;
      font-weight: bold;
      color: #FF6B35;
      margin-bottom: 8px;
      text-transform: uppercase;
    }
    .festival-name {
      font-size: 18px;
      font-weight: 600;
      color: #333;
      margin-bottom: 10px;
      background: #FF6B3515;
      padding: 8px 16px;
      border-radius: 20px;
      display: inline-block;
    }
    .receipt-title {
      font-size: 16px;
      color: #666;
      margin-bottom: 10px;
    }
    .receipt-id {
      font-size: 12px;
      color: #999;
      font-family: monospace;
      background: #f0f0f0;
      padding: 4px 8px;
      border-radius: 4px;
    }
    .details {
      margin: 25px 0;
    }
    .detail-row {
      display: flex;
      justify-content: space-between;
      margin: 15px 0;
      padding: 12px 0;
      border-bottom: 2px dotted #ddd;
    }
    .detail-label {
      font-weight: 700;
      color: #333;
      font-size: 16px;
    }
    .detail-value {
      color: #666;
      text-align: right;
      font-size: 16px;
    }
    .amount {
      font-size: 28px;
      font-weight: bold;
      color: #FF6B35;
    }
    .footer {
      text-align: center;
      margin-top: 30px;
      padding-top: 20px;
      border-top: 3px solid #FF6B35;
      color: #666;
      font-size: 14px;
      line-height: 1.6;
    }
    .thank-you {
      font-weight: 700;
      color: #FF6B35;
      margin-bottom: 12px;
      font-size: 18px;
    }
    .blessing {
      font-size: 16px;
      color: #333;
      margin: 8px 0;
    }
    .app-footer {
      font-size: 12px;
      color: #999;
      margin-top: 15px;
      font-style: italic;
    }
"#;

/// A self-contained styled receipt for one donation, ready for the
/// HTML-to-PDF service. Donor-facing fields are interpolated verbatim.
pub fn receipt_html(donation: &Donation) -> String {
    let formatted_date = format_date(&donation.donation_date);
    let formatted_time = format_time(&donation.donation_time);

    // The email row disappears entirely when no email was recorded.
    let email_row = match &donation.email {
        Some(email) => format!(
            r#"
              <div class="detail-row">
                <span class="detail-label">Email:</span>
                <span class="detail-value">{email}</span>
              </div>"#
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Donation Receipt</title>
    <style>{style}</style>
  </head>
  <body>
    <div class="receipt">
      <div class="header">
        <div class="mandal-name">{mandal_name}</div>
        <div class="festival-name">Festival: {festival_name}</div>
        <div class="receipt-title">Donation Receipt</div>
        <div class="receipt-id">Receipt ID: {receipt_id}</div>
      </div>

      <div class="details">
        <div class="detail-row">
          <span class="detail-label">Donor Name:</span>
          <span class="detail-value">{donor_name}</span>
        </div>
        <div class="detail-row">
          <span class="detail-label">Amount Donated:</span>
          <span class="detail-value amount">₹ {amount}</span>
        </div>
        <div class="detail-row">
          <span class="detail-label">Date &amp; Time:</span>
          <span class="detail-value">{formatted_date}, {formatted_time}</span>
        </div>
        <div class="detail-row">
          <span class="detail-label">Contact:</span>
          <span class="detail-value">{mobile_number}</span>
        </div>{email_row}
      </div>

      <div class="footer">
        <div class="thank-you">🙏 Thank you for your generous contribution 🙏</div>
        <div class="blessing">towards {festival_name}.</div>
        <div class="blessing">May the divine bless you and your family!</div>
        <div class="app-footer">Issued by Neem - Smart Chanda Collection App</div>
      </div>
    </div>
  </body>
</html>
"#,
        style = RECEIPT_STYLE,
        mandal_name = donation.mandal_name,
        festival_name = donation.festival_name,
        receipt_id = donation.receipt_id,
        donor_name = donation.donor_name,
        amount = donation.amount,
        mobile_number = donation.mobile_number,
        email_row = email_row,
    )
}

pub fn email_subject(donation: &Donation) -> String {
    format!(
        "Donation Receipt - {} - {}",
        donation.mandal_name, donation.festival_name
    )
}

pub fn email_body(donation: &Donation) -> String {
    format!(
        "Dear {donor},\n\nThank you for your generous donation of ₹{amount} to {mandal} for \
         {festival}.\n\nYour receipt is attached to this email.\n\nReceipt ID: {receipt_id}\n\n\
         May the divine bless you and your family!\n\n🙏 With gratitude 🙏",
        donor = donation.donor_name,
        amount = donation.amount,
        mandal = donation.mandal_name,
        festival = donation.festival_name,
        receipt_id = donation.receipt_id,
    )
}

pub fn sms_text(donation: &Donation) -> String {
    format!(
        "🙏 Thank you for your donation of ₹{amount} to {mandal} for {festival}! \
         Receipt ID: {receipt_id}. May the divine bless you!",
        amount = donation.amount,
        mandal = donation.mandal_name,
        festival = donation.festival_name,
        receipt_id = donation.receipt_id,
    )
}

const REPORT_STYLE: &str = r#"
    body {
      font-family: Arial, sans-serif;
      margin: 20px;
      color: #333;
    }
    .header {
      text-align: center;
      margin-bottom: 30px;
      border-bottom: 2px solid #FF6B35;
      padding-bottom: 20px;
    }
    .title {
      font-size: 24px;
      font-weight: bold;
      color: #FF6B35;
      margin-bottom: 10px;
    }
    .summary {
      display: flex;
      justify-content: space-around;
      margin-bottom: 30px;
    }
    .summary-item {
      text-align: center;
    }
    .summary-value {
      font-size: 20px;
      font-weight: bold;
      color: #FF6B35;
    }
    .summary-label {
      font-size: 12px;
      color: #666;
    }
    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 12px;
    }
    th, td {
      border: 1px solid #ddd;
      padding: 8px;
      text-align: left;
    }
    th {
      background-color: #FF6B35;
      color: white;
    }
    tr:nth-child(even) {
      background-color: #f9f9f9;
    }
    .footer {
      text-align: center;
      margin-top: 30px;
      color: #666;
      font-size: 12px;
    }
"#;

/// Tabular report over the given donations (search-filtered or the full
/// list) with count, total, and average up top. An empty set reports an
/// average of 0 rather than a division by zero.
pub fn report_html(donations: &[Donation]) -> String {
    let total_amount: f64 = donations.iter().map(|d| d.amount).sum();
    let average = if donations.is_empty() {
        0
    } else {
        (total_amount / donations.len() as f64).round() as i64
    };

    let mut rows = String::new();
    for donation in donations {
        rows.push_str(&format!(
            "<tr>\
             <td>{}</td>\
             <td>₹{}</td>\
             <td>{}</td>\
             <td>{}</td>\
             <td>{}</td>\
             <td>{}</td>\
             <td>{}</td>\
             <td>{}</td>\
             </tr>\n",
            donation.donor_name,
            donation.amount,
            format_date(&donation.donation_date),
            format_time(&donation.donation_time),
            donation.festival_name,
            donation.mobile_number,
            donation.email.as_deref().unwrap_or("-"),
            donation.receipt_id,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Donations Report</title>
    <style>{style}</style>
  </head>
  <body>
    <div class="header">
      <div class="title">Neem - Donations Report</div>
      <div>Generated on {generated_on}</div>
    </div>

    <div class="summary">
      <div class="summary-item">
        <div class="summary-value">{count}</div>
        <div class="summary-label">Total Donations</div>
      </div>
      <div class="summary-item">
        <div class="summary-value">{total}</div>
        <div class="summary-label">Total Amount</div>
      </div>
      <div class="summary-item">
        <div class="summary-value">₹{average}</div>
        <div class="summary-label">Average Donation</div>
      </div>
    </div>

    <table>
      <thead>
        <tr>
          <th>Donor Name</th>
          <th>Amount</th>
          <th>Date</th>
          <th>Time</th>
          <th>Festival</th>
          <th>Mobile</th>
          <th>Email</th>
          <th>Receipt ID</th>
        </tr>
      </thead>
      <tbody>
        {rows}
      </tbody>
    </table>

    <div class="footer">
      <p>This report contains {count} donation records</p>
      <p>🙏 May the divine bless all our donors 🙏</p>
    </div>
  </body>
</html>
"#,
        style = REPORT_STYLE,
        generated_on = Local::now().format("%d/%m/%Y"),
        count = donations.len(),
        total = format_currency(total_amount),
        average = average,
        rows = rows,
    )
}
