use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Template variables passed to AutoSend's handlebars templates.
pub type DynamicData = BTreeMap<String, Value>;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailAddress {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new<S: Into<String>>(email: S) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<&str> for EmailAddress {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for EmailAddress {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

/// Parameters for [`Client::send_email`](crate::Client::send_email).
///
/// Either `subject` with `html` and/or `text`, or a `template_id` with
/// optional `dynamic_data`, should be provided. Nothing is validated locally:
/// AutoSend decides whether the combination is acceptable.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailParams {
    pub to: EmailAddress,
    pub from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_data: Option<DynamicData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribe_group_id: Option<String>,
}

/// Setters shared by the single and bulk send parameters.
macro_rules! content_setters {
    ($ty:ty) => {
        impl $ty {
            pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
                self.subject = Some(subject.into());
                self
            }

            pub fn html<S: Into<String>>(mut self, html: S) -> Self {
                self.html = Some(html.into());
                self
            }

            pub fn text<S: Into<String>>(mut self, text: S) -> Self {
                self.text = Some(text.into());
                self
            }

            pub fn template_id<S: Into<String>>(mut self, template_id: S) -> Self {
                self.template_id = Some(template_id.into());
                self
            }

            pub fn dynamic_data(mut self, dynamic_data: DynamicData) -> Self {
                self.dynamic_data = Some(dynamic_data);
                self
            }

            pub fn reply_to<A: Into<EmailAddress>>(mut self, reply_to: A) -> Self {
                self.reply_to = Some(reply_to.into());
                self
            }

            pub fn unsubscribe_group_id<S: Into<String>>(mut self, group_id: S) -> Self {
                self.unsubscribe_group_id = Some(group_id.into());
                self
            }
        }
    };
}

impl SendEmailParams {
    pub fn new<T: Into<EmailAddress>, F: Into<EmailAddress>>(to: T, from: F) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            ..Default::default()
        }
    }
}

content_setters!(SendEmailParams);

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub email_id: String,
    pub status: String,
}

/// Parameters for [`Client::send_bulk_email`](crate::Client::send_bulk_email).
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendBulkEmailParams {
    pub recipients: Vec<EmailAddress>,
    pub from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_data: Option<DynamicData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribe_group_id: Option<String>,
}

impl SendBulkEmailParams {
    pub fn new<I, A, F>(recipients: I, from: F) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<EmailAddress>,
        F: Into<EmailAddress>,
    {
        Self {
            recipients: recipients.into_iter().map(Into::into).collect(),
            from: from.into(),
            ..Default::default()
        }
    }
}

content_setters!(SendBulkEmailParams);

/// Aggregate outcome of a bulk send. AutoSend does not report per-recipient results.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendBulkEmailResponse {
    pub batch_id: String,
    pub total_recipients: u64,
    pub success_count: u64,
    pub failed_count: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactParams {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, String>>,
}

/// Upserts take the same shape as creates; the email is the key.
pub type UpsertContactParams = CreateContactParams;

impl CreateContactParams {
    pub fn new<S: Into<String>>(email: S) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn first_name<S: Into<String>>(mut self, first_name: S) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn last_name<S: Into<String>>(mut self, last_name: S) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn custom_field<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.custom_fields
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A contact as stored by AutoSend.
///
/// `id`, `project_id` and the timestamps are assigned by the service.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, String>>,
    pub created_at: String,
    pub updated_at: String,
    pub project_id: String,
}

pub type CreateContactResponse = Contact;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoveContactsParams {
    pub emails: Vec<String>,
}

impl RemoveContactsParams {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoveContactsResponse {
    pub success: bool,
}
