//! Login form discovery.
//!
//! The login page is not stable: the site has served several form shapes over
//! time. Instead of assuming one, every `<form>` is reduced to an ordered list
//! of name/value pairs and searched for the username and password fields.

use monitor_logging::monitor_warn;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::Credential;

/// Name used for an unnamed submit control, or when the form has none.
pub const DEFAULT_SUBMIT_NAME: &str = "login";
/// Value used for a submit control without a value.
pub const DEFAULT_SUBMIT_VALUE: &str = "Login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Option<String>,
    /// Successful controls in document order, hidden inputs included.
    pub fields: Vec<FormField>,
    pub submit: Option<SubmitControl>,
}

/// Exact input names the site uses for the login pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFieldNames {
    pub username: String,
    pub password: String,
}

impl Default for LoginFieldNames {
    fn default() -> Self {
        Self {
            username: "username".to_string(),
            password: "password".to_string(),
        }
    }
}

/// Every form on the page, in document order.
pub fn parse_forms(html: &str) -> Vec<LoginForm> {
    let doc = Html::parse_document(html);
    let (Ok(form_sel), Ok(control_sel), Ok(option_sel)) = (
        Selector::parse("form"),
        Selector::parse("input, select, textarea, button"),
        Selector::parse("option"),
    ) else {
        return Vec::new();
    };

    doc.select(&form_sel)
        .map(|form| read_form(form, &control_sel, &option_sel))
        .collect()
}

/// First form carrying both the username and the password field.
pub fn find_login_form(html: &str, names: &LoginFieldNames) -> Option<LoginForm> {
    parse_forms(html)
        .into_iter()
        .find(|form| form.has_field(&names.username) && form.has_field(&names.password))
}

/// Visible text of a page, one space between text nodes. Attribute values
/// such as a prefilled `value="..."` are not part of it.
pub fn page_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    doc.root_element()
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_form(form: ElementRef, control_sel: &Selector, option_sel: &Selector) -> LoginForm {
    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(ToOwned::to_owned);

    let mut fields = Vec::new();
    let mut submit = None;

    for control in form.select(control_sel) {
        let element = control.value();
        let name = element.attr("name").map(ToOwned::to_owned);
        let kind = element.attr("type").unwrap_or_default().to_ascii_lowercase();

        match element.name() {
            "button" => {
                if (kind.is_empty() || kind == "submit") && submit.is_none() {
                    submit = Some(SubmitControl {
                        name,
                        value: element.attr("value").map(ToOwned::to_owned),
                    });
                }
            }
            "input" => match kind.as_str() {
                "submit" => {
                    if submit.is_none() {
                        submit = Some(SubmitControl {
                            name,
                            value: element.attr("value").map(ToOwned::to_owned),
                        });
                    }
                }
                "reset" | "button" | "image" | "file" => {}
                "checkbox" | "radio" => {
                    if let (Some(name), Some(_)) = (name, element.attr("checked")) {
                        let value = element.attr("value").unwrap_or("on").to_string();
                        fields.push(FormField { name, value });
                    }
                }
                _ => {
                    if let Some(name) = name {
                        let value = element.attr("value").unwrap_or_default().to_string();
                        fields.push(FormField { name, value });
                    }
                }
            },
            "select" => {
                if let Some(name) = name {
                    let value = selected_option(control, option_sel).unwrap_or_default();
                    fields.push(FormField { name, value });
                }
            }
            "textarea" => {
                if let Some(name) = name {
                    fields.push(FormField {
                        name,
                        value: control.text().collect(),
                    });
                }
            }
            _ => {}
        }
    }

    LoginForm {
        action,
        fields,
        submit,
    }
}

fn selected_option(select: ElementRef, option_sel: &Selector) -> Option<String> {
    let mut options = select.select(option_sel).peekable();
    let first = *options.peek()?;
    let chosen = options
        .find(|opt| opt.value().attr("selected").is_some())
        .unwrap_or(first);
    Some(match chosen.value().attr("value") {
        Some(value) => value.to_string(),
        None => chosen.text().collect::<String>().trim().to_string(),
    })
}

impl LoginForm {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }

    /// Parameters to post: every collected field, credentials swapped in, then the submit pair.
    pub fn submission_params(
        &self,
        names: &LoginFieldNames,
        credential: &Credential,
    ) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();

        upsert(&mut params, &names.username, credential.username());
        upsert(&mut params, &names.password, credential.password());

        match &self.submit {
            Some(control) => {
                let value = control.value.as_deref().unwrap_or(DEFAULT_SUBMIT_VALUE);
                let name = control.name.as_deref().unwrap_or(DEFAULT_SUBMIT_NAME);
                upsert(&mut params, name, value);
            }
            None => upsert(&mut params, DEFAULT_SUBMIT_NAME, DEFAULT_SUBMIT_VALUE),
        }
        params
    }

    /// Where to post the form. Relative actions resolve against the site root.
    pub fn submission_target(&self, site: &Url, default_endpoint: &Url) -> Url {
        let Some(action) = self.action.as_deref() else {
            return default_endpoint.clone();
        };
        if action.to_ascii_lowercase().starts_with("javascript:") {
            return default_endpoint.clone();
        }

        let mut root = site.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        match root.join(action) {
            Ok(url) => url,
            Err(err) => {
                monitor_warn!("Unusable form action {:?} ({}); using default endpoint", action, err);
                default_endpoint.clone()
            }
        }
    }
}

fn upsert(params: &mut Vec<(String, String)>, name: &str, value: &str) {
    match params.iter_mut().find(|(n, _)| n == name) {
        Some(entry) => entry.1 = value.to_string(),
        None => params.push((name.to_string(), value.to_string())),
    }
}
