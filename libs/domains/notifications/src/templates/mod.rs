//! Handlebars rendering for the order confirmation email.

use crate::error::{NotificationError, NotificationResult};
use crate::models::OrderConfirmationData;
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

pub const ORDER_CONFIRMATION_SUBJECT: &str = "Order Confirmation";

/// Rendered email content.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
    pub subject: String,
}

/// Template engine with every email template registered up front.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        handlebars
            .register_template_string("order_confirmation_html", ORDER_CONFIRMATION_HTML_TEMPLATE)
            .map_err(|e| {
                NotificationError::TemplateError(format!(
                    "Failed to register order_confirmation_html: {}",
                    e
                ))
            })?;
        handlebars
            .register_template_string("order_confirmation_text", ORDER_CONFIRMATION_TEXT_TEMPLATE)
            .map_err(|e| {
                NotificationError::TemplateError(format!(
                    "Failed to register order_confirmation_text: {}",
                    e
                ))
            })?;

        Ok(Self { handlebars })
    }

    fn render<T: Serialize>(&self, template_name: &str, data: &T) -> NotificationResult<String> {
        Ok(self.handlebars.render(template_name, data)?)
    }

    pub fn render_order_confirmation(
        &self,
        data: &OrderConfirmationData,
    ) -> NotificationResult<RenderedEmail> {
        debug!(order_id = %data.order_id, "Rendering order confirmation email");

        Ok(RenderedEmail {
            html: self.render("order_confirmation_html", data)?,
            text: self.render("order_confirmation_text", data)?,
            subject: ORDER_CONFIRMATION_SUBJECT.to_string(),
        })
    }
}

const ORDER_CONFIRMATION_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Order Confirmation</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 40px;">
        <h1 style="color: #18181b; font-size: 24px; margin: 0 0 16px 0;">Order: #{{order_id}}</h1>
        <p style="color: #52525b; font-size: 16px; margin: 0 0 24px 0;">You ordered {{product_count}} products</p>
        <table width="100%" cellspacing="0" cellpadding="0">
          {{#each products}}
          <tr>
            <td style="padding: 4px 0;">{{title}}</td>
            <td style="padding: 4px 0; text-align: center;">&times; {{quantity}}</td>
            <td style="padding: 4px 0; text-align: right;">{{price}}</td>
          </tr>
          {{/each}}
        </table>
        <p style="color: #18181b; font-size: 16px; font-weight: 600; margin: 24px 0 0 0; text-align: right;">Total: {{total}}</p>
      </td>
    </tr>
  </table>
</body>
</html>
"#;

const ORDER_CONFIRMATION_TEXT_TEMPLATE: &str = r#"Order: #{{order_id}}

You ordered {{product_count}} products
{{#each products}}
- {{{title}}} x {{quantity}} @ {{price}}
{{/each}}

Total: {{total}}
"#;
