use anyhow::{anyhow, Context};
use autosend::{
    Client, CreateContactParams, DynamicData, EmailAddress, RemoveContactsParams,
    SendBulkEmailParams, SendEmailParams,
};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser, Clone)]
#[command(name = "autosend")]
#[command(about = "A CLI tool to send emails and manage contacts with AutoSend")]
struct Cli {
    #[arg(short, long, env = "AUTOSEND_API_KEY", hide_env_values = true)]
    api_key: String,
    #[arg(short, long, env = "AUTOSEND_BASE_URL")]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand, Clone)]
enum Commands {
    #[command(about = "Sends a single email")]
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        to_name: Option<String>,
        #[command(flatten)]
        content: Content,
    },
    #[command(about = "Sends the same email to many recipients")]
    Bulk {
        #[arg(long = "recipient", required = true)]
        recipients: Vec<String>,
        #[command(flatten)]
        content: Content,
    },
    #[command(about = "Creates a contact")]
    CreateContact(ContactArgs),
    #[command(about = "Creates or updates a contact by email")]
    UpsertContact(ContactArgs),
    #[command(about = "Removes contacts by email")]
    RemoveContacts {
        #[arg(long = "email", required = true)]
        emails: Vec<String>,
    },
}

#[derive(Debug, Args, Clone)]
struct Content {
    #[arg(long)]
    from: String,
    #[arg(long)]
    from_name: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    html: Option<String>,
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    template_id: Option<String>,
    /// Template variable as KEY=VALUE, where VALUE is JSON or a plain string
    #[arg(long = "data", value_parser = parse_data)]
    data: Vec<(String, Value)>,
    #[arg(long)]
    reply_to: Option<String>,
    #[arg(long, requires = "reply_to")]
    reply_to_name: Option<String>,
    #[arg(long)]
    unsubscribe_group_id: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct ContactArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    user_id: Option<String>,
    /// Custom field as KEY=VALUE
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_data(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = parse_field(raw)?;
    let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
    Ok((key, value))
}

fn address(email: String, name: Option<String>) -> EmailAddress {
    EmailAddress { email, name }
}

impl Content {
    fn into_send(self, to: EmailAddress) -> SendEmailParams {
        let dynamic_data = self.dynamic_data();
        SendEmailParams {
            to,
            from: address(self.from, self.from_name),
            subject: self.subject,
            html: self.html,
            text: self.text,
            template_id: self.template_id,
            dynamic_data,
            reply_to: self
                .reply_to
                .map(|email| address(email, self.reply_to_name)),
            unsubscribe_group_id: self.unsubscribe_group_id,
        }
    }

    fn into_bulk(self, recipients: Vec<String>) -> SendBulkEmailParams {
        let SendEmailParams {
            from,
            subject,
            html,
            text,
            template_id,
            dynamic_data,
            reply_to,
            unsubscribe_group_id,
            ..
        } = self.into_send(EmailAddress::default());
        SendBulkEmailParams {
            recipients: recipients.into_iter().map(EmailAddress::new).collect(),
            from,
            subject,
            html,
            text,
            template_id,
            dynamic_data,
            reply_to,
            unsubscribe_group_id,
        }
    }

    fn dynamic_data(&self) -> Option<DynamicData> {
        if self.data.is_empty() {
            return None;
        }
        Some(self.data.iter().cloned().collect())
    }
}

impl From<ContactArgs> for CreateContactParams {
    fn from(args: ContactArgs) -> Self {
        CreateContactParams {
            email: args.email,
            first_name: args.first_name,
            last_name: args.last_name,
            user_id: args.user_id,
            custom_fields: if args.fields.is_empty() {
                None
            } else {
                Some(args.fields.into_iter().collect())
            },
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(client: &Client, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Send {
            to,
            to_name,
            content,
        } => {
            let sent = client
                .send_email(&content.into_send(address(to, to_name)))
                .await
                .map_err(describe)?;
            tracing::info!(email_id = %sent.email_id, "email accepted");
            print_json(&sent)
        }
        Commands::Bulk {
            recipients,
            content,
        } => {
            let batch = client
                .send_bulk_email(&content.into_bulk(recipients))
                .await
                .map_err(describe)?;
            tracing::info!(batch_id = %batch.batch_id, "bulk email accepted");
            print_json(&batch)
        }
        Commands::CreateContact(args) => {
            let contact = client.create_contact(&args.into()).await.map_err(describe)?;
            print_json(&contact)
        }
        Commands::UpsertContact(args) => {
            let contact = client.upsert_contact(&args.into()).await.map_err(describe)?;
            print_json(&contact)
        }
        Commands::RemoveContacts { emails } => {
            let removed = client
                .remove_contacts(&RemoveContactsParams::new(emails))
                .await
                .map_err(describe)?;
            print_json(&removed)
        }
    }
}

/// Renders the status code and captured body alongside the message.
fn describe(err: autosend::Error) -> anyhow::Error {
    let mut description = err.to_string();
    if let Some(status) = err.status_code() {
        description = format!("{description} (HTTP {status})");
    }
    if let Some(body) = err.response() {
        description = format!("{description}\nresponse: {body}");
    }
    anyhow!(description)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let mut builder = Client::builder(&args.api_key);
    if let Some(base_url) = &args.base_url {
        builder = builder.base_url(base_url);
    }
    let client = builder.build().context("invalid AutoSend configuration")?;

    run(&client, args.command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["autosend", "--api-key", "as_test"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn data_values_are_json_when_possible() {
        assert_eq!(parse_data("count=3").unwrap(), ("count".into(), json!(3)));
        assert_eq!(
            parse_data("name=Ada").unwrap(),
            ("name".into(), json!("Ada"))
        );
        assert_eq!(
            parse_data("tags=[\"a\",\"b\"]").unwrap(),
            ("tags".into(), json!(["a", "b"]))
        );
        assert!(parse_data("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn send_builds_params_from_flags() {
        let cli = parse(&[
            "send",
            "--to",
            "a@b.com",
            "--to-name",
            "A",
            "--from",
            "c@d.com",
            "--template-id",
            "tpl_1",
            "--data",
            "promo=10",
        ]);

        let Commands::Send {
            to,
            to_name,
            content,
        } = cli.command
        else {
            panic!("expected send command");
        };
        let params = content.into_send(address(to, to_name));

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "to": { "email": "a@b.com", "name": "A" },
                "from": { "email": "c@d.com" },
                "templateId": "tpl_1",
                "dynamicData": { "promo": 10 }
            })
        );
    }

    #[test]
    fn reply_to_accepts_a_name() {
        let cli = parse(&[
            "send",
            "--to",
            "a@b.com",
            "--from",
            "c@d.com",
            "--reply-to",
            "support@d.com",
            "--reply-to-name",
            "Support",
        ]);
        let Commands::Send {
            to,
            to_name,
            content,
        } = cli.command
        else {
            panic!("expected send command");
        };
        let params = content.into_send(address(to, to_name));

        assert_eq!(
            params.reply_to,
            Some(EmailAddress::new("support@d.com").with_name("Support"))
        );
        assert!(Cli::try_parse_from([
            "autosend",
            "-a",
            "k",
            "send",
            "--to",
            "a@b.com",
            "--from",
            "c@d.com",
            "--reply-to-name",
            "Support",
        ])
        .is_err());
    }

    #[test]
    fn bulk_requires_recipients_and_keeps_content() {
        assert!(Cli::try_parse_from(["autosend", "-a", "k", "bulk", "--from", "c@d.com"]).is_err());

        let cli = parse(&[
            "bulk",
            "--recipient",
            "a@b.com",
            "--recipient",
            "e@f.com",
            "--from",
            "c@d.com",
            "--subject",
            "Hi",
            "--text",
            "hi",
        ]);
        let Commands::Bulk {
            recipients,
            content,
        } = cli.command
        else {
            panic!("expected bulk command");
        };
        let params = content.into_bulk(recipients);

        assert_eq!(params.recipients.len(), 2);
        assert_eq!(params.subject.as_deref(), Some("Hi"));
        assert_eq!(params.from, EmailAddress::new("c@d.com"));
    }

    #[test]
    fn contact_fields_become_custom_fields() {
        let cli = parse(&[
            "upsert-contact",
            "--email",
            "x@y.com",
            "--field",
            "plan=pro",
        ]);
        let Commands::UpsertContact(args) = cli.command else {
            panic!("expected upsert-contact command");
        };
        let params: CreateContactParams = args.into();

        assert_eq!(params, CreateContactParams::new("x@y.com").custom_field("plan", "pro"));
    }

    #[test]
    fn describe_without_status_or_body_is_just_the_message() {
        let err = autosend::Error::new("boom");
        assert_eq!(describe(err).to_string(), "boom");
    }
}
