/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! The contact form: what the page posts, how it is checked and the two
//! emails it produces (a notification for the dealership and an automatic
//! reply to the sender).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::email::{EmailMessage, EmailSettings};
use crate::helpers::escape_html;

pub const DEALER_PHONE: &str = "0 (532) 333 57 94";
pub const DEALER_ADDRESS: &str = "Cevher Oto Center, Karacaahmet, Gaziantep";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),
    #[error("Invalid email format")]
    InvalidEmail,
}

/// A contact form submission as posted by the page.
///
/// Required fields are deserialised as empty when absent so that
/// validation can report them rather than the JSON decoder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Check required fields are present and the email looks like an email
    pub fn validate(&self) -> Result<(), ContactError> {
        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(ContactError::MissingFields(missing));
        }

        if !EMAIL_REGEX.is_match(self.email.trim()) {
            return Err(ContactError::InvalidEmail);
        }
        Ok(())
    }

    fn subject_or<'a>(&'a self, default: &'a str) -> &'a str {
        match &self.subject {
            Some(subject) if !subject.trim().is_empty() => subject,
            _ => default,
        }
    }

    /// The email telling the dealership about this submission
    pub fn notification_email(&self, settings: &EmailSettings, sent_at: &str) -> EmailMessage {
        let name = escape_html(&self.name);
        let email = escape_html(&self.email);
        let phone = escape_html(&self.phone);
        let subject = escape_html(self.subject_or("Belirtilmemiş"));
        let message = escape_html(&self.message).replace('\n', "<br>");

        let field = |label: &str, value: &str| {
            format!(
                r#"<div style="margin-bottom: 15px;"><strong style="color: #ff6b35;">{label}:</strong><span style="margin-left: 10px;">{value}</span></div>"#
            )
        };

        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<div style="background: #ff6b35; color: white; padding: 20px; text-align: center;"><h1 style="margin: 0;">MÜJDE AUTO</h1><p style="margin: 10px 0 0 0;">Yeni İletişim Formu</p></div>
<div style="padding: 20px; background: #f8f9fa;">
<h2 style="color: #333;">Form Detayları</h2>
{}{}{}{}
<div style="margin-bottom: 20px;"><strong style="color: #ff6b35;">Mesaj:</strong><div style="margin-top: 10px; padding: 15px; background: white; border-left: 4px solid #ff6b35;">{message}</div></div>
</div>
<div style="background: #212529; color: white; padding: 15px; text-align: center; font-size: 12px;"><p style="margin: 0;">Bu mesaj MÜJDE AUTO web sitesinden gönderilmiştir.</p><p style="margin: 5px 0 0 0;">Gönderim Zamanı: {sent_at}</p></div>
</div>"#,
            field("Ad Soyad", &name),
            field("E-posta", &email),
            field("Telefon", &phone),
            field("Konu", &subject),
        );

        EmailMessage {
            to: settings.dealer_address.clone(),
            from: settings.from_address.clone(),
            from_name: Some(settings.site_sender_name.clone()),
            subject: format!("Yeni İletişim Formu: {}", self.subject_or("Genel")),
            html,
        }
    }

    /// The automatic reply sent back to whoever filled in the form
    pub fn auto_reply_email(&self, settings: &EmailSettings) -> EmailMessage {
        let name = escape_html(&self.name);
        let dealer = escape_html(&settings.dealer_address);

        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
<div style="background: #ff6b35; color: white; padding: 20px; text-align: center;"><h1 style="margin: 0;">MÜJDE AUTO</h1><p style="margin: 10px 0 0 0;">Mesajınız Alındı</p></div>
<div style="padding: 20px;">
<p>Sayın <strong>{name}</strong>,</p>
<p>MÜJDE AUTO web sitesinden gönderdiğiniz mesaj başarıyla alınmıştır.</p>
<p>En kısa sürede size dönüş yapacağız.</p>
<div style="background: #f8f9fa; padding: 15px; margin: 20px 0; border-radius: 5px;">
<h3 style="margin-top: 0; color: #ff6b35;">İletişim Bilgilerimiz</h3>
<p><strong>Telefon:</strong> {DEALER_PHONE}</p>
<p><strong>E-posta:</strong> {dealer}</p>
<p><strong>Adres:</strong> {DEALER_ADDRESS}</p>
</div>
<p>Teşekkürler,<br><strong>MÜJDE AUTO Ekibi</strong></p>
</div>
<div style="background: #212529; color: white; padding: 15px; text-align: center; font-size: 12px;"><p style="margin: 0;">Bu e-posta otomatik olarak gönderilmiştir. Lütfen yanıtlamayınız.</p></div>
</div>"#
        );

        EmailMessage {
            to: self.email.trim().to_string(),
            from: settings.from_address.clone(),
            from_name: Some(crate::SITE_NAME.to_string()),
            subject: "Mesajınız Alındı - MÜJDE AUTO".to_string(),
            html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ContactForm {
        ContactForm {
            name: "Ayşe Yılmaz".to_string(),
            email: "ayse@example.com".to_string(),
            phone: "0532 333 57 94".to_string(),
            subject: Some("Passat".to_string()),
            message: "Merhaba,\nAraç hâlâ satılık mı?".to_string(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert_eq!(valid_form().validate(), Ok(()));
    }

    #[test]
    fn missing_fields_are_listed() {
        let form = ContactForm {
            name: " ".to_string(),
            message: String::new(),
            ..valid_form()
        };
        assert_eq!(
            form.validate(),
            Err(ContactError::MissingFields(vec!["name", "message"]))
        );
    }

    #[test]
    fn subject_is_optional() {
        let form = ContactForm {
            subject: None,
            ..valid_form()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn email_format_is_checked() {
        for bad in ["ayse", "ayse@example", "ay se@example.com", "@example.com", "a@b@c.com"] {
            let form = ContactForm {
                email: bad.to_string(),
                ..valid_form()
            };
            assert_eq!(form.validate(), Err(ContactError::InvalidEmail), "{bad}");
        }
    }

    #[test]
    fn deserialises_with_missing_fields() {
        let form: ContactForm =
            serde_json::from_str(r#"{"name": "Ali", "_csrf": "token"}"#).unwrap();
        assert_eq!(form.name, "Ali");
        assert!(matches!(form.validate(), Err(ContactError::MissingFields(_))));
    }

    #[test]
    fn notification_email_escapes_and_defaults_subject() {
        let settings = EmailSettings::default();
        let form = ContactForm {
            subject: None,
            message: "<b>bold</b>\nline two".to_string(),
            ..valid_form()
        };
        let email = form.notification_email(&settings, "01.01.2025 10:00:00");

        assert_eq!(email.to, settings.dealer_address);
        assert_eq!(email.subject, "Yeni İletişim Formu: Genel");
        assert!(email.html.contains("&lt;b&gt;bold&lt;/b&gt;<br>line two"));
        assert!(email.html.contains("Belirtilmemiş"));
        assert!(email.html.contains("01.01.2025 10:00:00"));
    }

    #[test]
    fn auto_reply_goes_to_sender() {
        let email = valid_form().auto_reply_email(&EmailSettings::default());
        assert_eq!(email.to, "ayse@example.com");
        assert_eq!(email.subject, "Mesajınız Alındı - MÜJDE AUTO");
        assert!(email.html.contains("Ayşe Yılmaz"));
    }
}
