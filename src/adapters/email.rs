//! SMTP delivery: the weekly report mail and the halt notification.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Attachment, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{ReportMailer, RunSummary};
use crate::config::EmailConfig;

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(cfg: &EmailConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.user.clone(), cfg.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
            .context("invalid SMTP host")?
            .credentials(creds)
            .build();

        let from: Mailbox = cfg.from.parse().context("invalid sender address")?;
        let recipients = cfg
            .recipients
            .iter()
            .map(|r| r.parse().with_context(|| format!("invalid recipient `{r}`")))
            .collect::<Result<Vec<Mailbox>>>()?;

        Ok(Self {
            mailer,
            from,
            recipients,
        })
    }

    fn builder(&self, subject: String) -> lettre::message::MessageBuilder {
        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for to in &self.recipients {
            builder = builder.to(to.clone());
        }
        builder
    }
}

fn report_body(summary: &RunSummary) -> String {
    format!(
        "AI Trend Report — {}\n\n\
         Articles analyzed: {}\n\
         Papers analyzed:   {}\n\
         Top keywords:      {}\n\
         Trending theme:    {}\n\
         Run sheet:         {}\n",
        summary.run_date,
        summary.article_count,
        summary.paper_count,
        summary.top_keywords.join(", "),
        summary.trending_theme.as_deref().unwrap_or("N/A"),
        summary.sheet_url.as_deref().unwrap_or("n/a"),
    )
}

#[async_trait]
impl ReportMailer for SmtpMailer {
    async fn send_report(&self, summary: &RunSummary) -> Result<bool> {
        let subject = format!("AI Trend Report — {}", summary.run_date);
        let body = report_body(summary);

        let text_part = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(body);

        let msg = match std::fs::read(&summary.pdf_path) {
            Ok(bytes) => {
                let attachment = Attachment::new("ai_trend_report.pdf".to_string()).body(
                    bytes,
                    "application/pdf".parse().context("attachment mime")?,
                );
                self.builder(subject)
                    .multipart(MultiPart::mixed().singlepart(text_part).singlepart(attachment))
                    .context("build report email")?
            }
            Err(e) => {
                tracing::warn!(path = %summary.pdf_path, error = %e, "pdf unreadable; sending without attachment");
                self.builder(subject)
                    .singlepart(text_part)
                    .context("build report email")?
            }
        };

        self.mailer.send(msg).await.context("send report email")?;
        Ok(true)
    }

    async fn send_failure(&self, run_date: &str, step: &str, error: &str) -> Result<()> {
        let subject = format!("AI Trend Report FAILED — {run_date}");
        let body = format!(
            "The report pipeline halted before completion.\n\n\
             Failed step: {step}\n\
             Reason:      {error}\n\n\
             No report was produced for this run.\n"
        );
        let msg = self
            .builder(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("build failure email")?;
        self.mailer.send(msg).await.context("send failure email")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_body_lists_run_facts() {
        let body = report_body(&RunSummary {
            run_date: "2024-05-01".into(),
            article_count: 40,
            paper_count: 12,
            top_keywords: vec!["agents".into(), "safety".into()],
            trending_theme: Some("Large Language Models".into()),
            pdf_path: "/tmp/report.pdf".into(),
            sheet_url: Some("https://sheets.example/run".into()),
        });
        assert!(body.contains("Articles analyzed: 40"));
        assert!(body.contains("agents, safety"));
        assert!(body.contains("https://sheets.example/run"));
    }
}
