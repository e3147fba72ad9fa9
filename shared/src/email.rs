use aws_sdk_sesv2::types::{Body as EmailBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;

use homeward_atoms::prospects::model::Prospect;

fn from_address() -> String {
    std::env::var("SES_FROM_ADDRESS").unwrap_or_else(|_| "noreply@homeward.estate".to_string())
}

fn content(data: &str) -> Result<Content, String> {
    Content::builder()
        .data(data)
        .build()
        .map_err(|e| format!("SES content error: {}", e))
}

/// Notify the sales desk that a prospect came in through the public form
pub async fn send_intake_email(
    client: &SesClient,
    to: &str,
    prospect: &Prospect,
) -> Result<(), String> {
    let subject = content(&format!("New prospect: {}", prospect.name))?;
    let text = content(&format!(
        "Name: {}\nPhone: {}\nInterest: {}\nMethod: {}\nSite: {}\nRemark: {}\n",
        prospect.name,
        prospect.phone,
        prospect.interest,
        prospect.method,
        prospect.site.as_deref().unwrap_or("-"),
        prospect.remark.as_deref().unwrap_or("-"),
    ))?;

    let message = Message::builder()
        .subject(subject)
        .body(EmailBody::builder().text(text).build())
        .build();

    client
        .send_email()
        .from_email_address(from_address())
        .destination(Destination::builder().to_addresses(to).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await
        .map_err(|e| format!("SES send_email error: {}", e))?;

    Ok(())
}
