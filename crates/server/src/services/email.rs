//! Email service for transactional mail.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Callers on
//! the order path treat every send as best-effort: failures are logged and
//! never fail the surrounding request.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;
use crate::models::order::{Order, OrderItem};

/// One rendered line of an order email.
struct EmailLineItem {
    name: String,
    quantity: i32,
    line_total: String,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_number: &'a str,
    customer_name: &'a str,
    total: String,
    items: Vec<EmailLineItem>,
    shipping_address: &'a str,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_number: &'a str,
    customer_name: &'a str,
    total: String,
    items: Vec<EmailLineItem>,
    shipping_address: &'a str,
}

/// HTML template for the order status email.
#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusHtml<'a> {
    order_number: &'a str,
    customer_name: &'a str,
    title: &'a str,
    message: &'a str,
}

/// Plain text template for the order status email.
#[derive(Template)]
#[template(path = "email/order_status.txt")]
struct OrderStatusText<'a> {
    order_number: &'a str,
    customer_name: &'a str,
    title: &'a str,
    message: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the order confirmation email.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), EmailError> {
        let rendered_items: Vec<EmailLineItem> = items
            .iter()
            .map(|item| EmailLineItem {
                name: item.product_name.clone(),
                quantity: item.quantity,
                line_total: format!("${}", item.line_total().round_dp(2)),
            })
            .collect();
        let total = format!("${}", order.total.round_dp(2));

        let html = OrderConfirmationHtml {
            order_number: order.order_number.as_str(),
            customer_name: &order.customer_name,
            total: total.clone(),
            items: rendered_items,
            shipping_address: &order.shipping_address,
        }
        .render()?;

        let rendered_items: Vec<EmailLineItem> = items
            .iter()
            .map(|item| EmailLineItem {
                name: item.product_name.clone(),
                quantity: item.quantity,
                line_total: format!("${}", item.line_total().round_dp(2)),
            })
            .collect();
        let text = OrderConfirmationText {
            order_number: order.order_number.as_str(),
            customer_name: &order.customer_name,
            total,
            items: rendered_items,
            shipping_address: &order.shipping_address,
        }
        .render()?;

        self.send_multipart_email(
            order.customer_email.as_str(),
            &format!("Order Confirmation - {}", order.order_number),
            &text,
            &html,
        )
        .await
    }

    /// Send an order status update email.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_status_update(
        &self,
        order: &Order,
        title: &str,
        message: &str,
    ) -> Result<(), EmailError> {
        let html = OrderStatusHtml {
            order_number: order.order_number.as_str(),
            customer_name: &order.customer_name,
            title,
            message,
        }
        .render()?;
        let text = OrderStatusText {
            order_number: order.order_number.as_str(),
            customer_name: &order.customer_name,
            title,
            message,
        }
        .render()?;

        self.send_multipart_email(
            order.customer_email.as_str(),
            &format!("Order Update - {}", order.order_number),
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_owned()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}
