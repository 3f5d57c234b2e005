//! An async client for the AutoSend transactional email and contacts API.
//!
//! Every operation is a single authenticated `POST`. A call either returns the
//! typed payload from AutoSend's `{ success, message, data }` envelope or an
//! [`Error`] describing what went wrong.
//!
//! ## Example
//!
//! ```no_run
//! use autosend::{Client, CreateContactParams, SendEmailParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("as_live_1234");
//!
//!     let contact = client
//!         .upsert_contact(&CreateContactParams::new("ada@example.com").first_name("Ada"))
//!         .await?;
//!     println!("Contact {} in project {}", contact.id, contact.project_id);
//!
//!     let params = SendEmailParams::new("ada@example.com", "hello@example.com")
//!         .template_id("welcome");
//!     match client.send_email(&params).await {
//!         Ok(sent) => println!("Queued {}", sent.email_id),
//!         Err(err) => match err.status_code() {
//!             Some(status) => eprintln!("HTTP {status}: {err}"),
//!             None => eprintln!("AutoSend refused the email: {err}"),
//!         },
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use error::Error;
pub use models::{
    Contact, CreateContactParams, CreateContactResponse, DynamicData, EmailAddress,
    RemoveContactsParams, RemoveContactsResponse, SendBulkEmailParams, SendBulkEmailResponse,
    SendEmailParams, SendEmailResponse, UpsertContactParams,
};

/// Result type alias for AutoSend operations.
pub type Result<T> = std::result::Result<T, Error>;
