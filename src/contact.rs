//! Public contact page of the gender commission.

use crate::i18n::Translator;
use serde::Serialize;
use std::fmt;

pub const COMMISSION_FACEBOOK_URL: &str = "https://www.facebook.com/Comisiondegenerotango/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub subtitle: String,
    pub intro: Option<String>,
    pub link: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPage {
    pub title: String,
    pub sections: Vec<Section>,
}

/// One bullet per non-blank line.
fn bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

impl ContactPage {
    pub fn build(translator: &dyn Translator) -> Self {
        Self {
            title: translator.t("contact.title"),
            sections: vec![
                Section {
                    subtitle: translator.t("contact.subtitle_1"),
                    intro: Some(translator.t("contact.body_1")),
                    link: Some(COMMISSION_FACEBOOK_URL.to_string()),
                    items: bullets(&translator.t("contact.body_2")),
                },
                Section {
                    subtitle: translator.t("contact.subtitle_2"),
                    intro: None,
                    link: None,
                    items: bullets(&translator.t("contact.body_3")),
                },
            ],
        }
    }
}

impl fmt::Display for ContactPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "{}", section.subtitle)?;
            match (&section.intro, &section.link) {
                (Some(intro), Some(link)) => writeln!(f, "{}{}", intro, link)?,
                (Some(intro), None) => writeln!(f, "{}", intro)?,
                (None, Some(link)) => writeln!(f, "{}", link)?,
                (None, None) => {}
            }
            for item in &section.items {
                writeln!(f, "  - {}", item)?;
            }
        }
        Ok(())
    }
}
