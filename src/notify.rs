use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::MailConfig;
use crate::decision::Outcome;
use crate::error::{RainError, Result};
use crate::histogram::Histogram;
use crate::model::GeoPoint;
use crate::time_bucket::TimeBucket;

/// 1 回の判定で集計した内容
#[derive(Debug, Clone, PartialEq)]
pub struct RainReport {
    pub target: GeoPoint,
    pub bucket: TimeBucket,
    pub inner_radius_km: f64,
    pub outer_radius_km: f64,
    pub inner: Histogram,
    pub outer: Histogram,
}

impl RainReport {
    /// 通知本文。降水ピクセルの割合と気象庁ナウキャストへのリンク
    pub fn body(&self) -> String {
        let line = |radius_km: f64, h: &Histogram| {
            format!(
                "    r = {:>2} km: {:6.2} % ({} / {} px)",
                radius_km,
                100.0 * h.rain_ratio(),
                h.rain(),
                h.total()
            )
        };

        format!(
            "rain pixels:\n{}\n{}\nlatlon: {}, datetime: {}\n\
             https://www.jma.go.jp/bosai/nowc/#zoom:10/lat:{:?}/lon:{:?}/colordepth:normal/elements:hrpns&liden&slmcs",
            line(self.inner_radius_km, &self.inner),
            line(self.outer_radius_km, &self.outer),
            self.target,
            self.bucket,
            self.target.lat,
            self.target.lon,
        )
    }
}

/// 送信するメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub outcome: Outcome,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(outcome: Outcome, report: &RainReport) -> Self {
        Self {
            outcome,
            subject: format!("{} at {}", outcome, report.bucket),
            body: report.body(),
        }
    }
}

pub trait Notifier {
    fn send(&self, notification: &Notification) -> Result<()>;
}

/// SMTP でメールを送る
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let parse = |addr: &str| {
            addr.parse::<Mailbox>()
                .map_err(|e| RainError::Config(format!("invalid mail address {:?}: {}", addr, e)))
        };

        Ok(Self {
            transport: SmtpTransport::builder_dangerous(config.smtp_host.as_str())
                .port(config.smtp_port)
                .build(),
            from: parse(&config.from)?,
            to: parse(&config.to)?,
        })
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| RainError::Notify(e.to_string()))?;

        self.transport
            .send(&message)
            .map_err(|e| RainError::Notify(e.to_string()))?;

        info!("Mail has been sent: {}", notification.subject);
        Ok(())
    }
}

/// ログに出すだけで送信しない
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        info!("[dry-run] {}\n{}", notification.subject, notification.body);
        Ok(())
    }
}
