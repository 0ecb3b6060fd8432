//! SharePoint Online user-credential sign-in helpers
//!
//! Sign-in is a two step exchange:
//! 1. A WS-Trust request carrying the user name and password is posted to
//!    the Microsoft Online security token service, which answers with a
//!    binary security token.
//! 2. That token is posted to the site's `/_forms/default.aspx` sign-in
//!    endpoint, which answers with the `FedAuth` and `rtFa` cookies used by
//!    every later REST call.
//!
//! Federated (ADFS) tenants are not supported.

use bridge_traits::HttpResponse;
use url::Url;

use crate::error::{Result, SharePointError};

/// Microsoft Online security token service endpoint
pub const DEFAULT_STS_URL: &str = "https://login.microsoftonline.com/extSTS.srf";

/// Sign-in endpoint, relative to the tenant origin
pub(crate) const SIGNIN_PATH: &str = "/_forms/default.aspx?wa=wsignin1.0";

/// Cookies that make up an authenticated session
pub(crate) const AUTH_COOKIES: [&str; 2] = ["FedAuth", "rtFa"];

pub(crate) const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Normalized `scheme://host[:port]` origin of an absolute http(s) URL
///
/// Default ports, userinfo, query and case differences are dropped, so
/// `HTTPS://user@Contoso.SharePoint.com:443/?x=1` yields
/// `https://contoso.sharepoint.com`.
pub(crate) fn origin_of(site_url: &str) -> Result<String> {
    let invalid = |reason: String| SharePointError::InvalidUrl {
        url: site_url.to_string(),
        reason,
    };

    let url = Url::parse(site_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("no host".to_string()));
    }

    Ok(url.origin().ascii_serialization())
}

/// WS-Trust issue request for `endpoint` (the tenant origin with a trailing `/`)
pub(crate) fn security_token_request(
    sts_url: &str,
    username: &str,
    password: &str,
    endpoint: &str,
) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://www.w3.org/2005/08/addressing" xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
  <s:Header>
    <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/02/trust/RST/Issue</a:Action>
    <a:ReplyTo><a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address></a:ReplyTo>
    <a:To s:mustUnderstand="1">{sts}</a:To>
    <o:Security s:mustUnderstand="1" xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <o:UsernameToken>
        <o:Username>{username}</o:Username>
        <o:Password>{password}</o:Password>
      </o:UsernameToken>
    </o:Security>
  </s:Header>
  <s:Body>
    <t:RequestSecurityToken xmlns:t="http://schemas.xmlsoap.org/ws/2005/02/trust">
      <wsp:AppliesTo xmlns:wsp="http://schemas.xmlsoap.org/ws/2004/09/policy">
        <a:EndpointReference><a:Address>{endpoint}</a:Address></a:EndpointReference>
      </wsp:AppliesTo>
      <t:KeyType>http://schemas.xmlsoap.org/ws/2005/05/identity/NoProofKey</t:KeyType>
      <t:RequestType>http://schemas.xmlsoap.org/ws/2005/02/trust/Issue</t:RequestType>
      <t:TokenType>urn:oasis:names:tc:SAML:1.0:assertion</t:TokenType>
    </t:RequestSecurityToken>
  </s:Body>
</s:Envelope>"#,
        sts = xml_escape(sts_url),
        username = xml_escape(username),
        password = xml_escape(password),
        endpoint = xml_escape(endpoint),
    )
}

/// Pull the binary security token out of an STS response.
///
/// A fault response becomes an `Authentication` error carrying the
/// service's reason text.
pub(crate) fn extract_security_token(body: &str) -> Result<String> {
    if let Some(token) = element_text(body, "BinarySecurityToken") {
        let token = xml_unescape(token.trim());
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let reason = element_text(body, "text")
        .or_else(|| element_text(body, "Text"))
        .map(|reason| xml_unescape(reason.trim()))
        .unwrap_or_else(|| "security token missing from STS response".to_string());

    Err(SharePointError::Authentication(reason))
}

/// Build a `Cookie` header value from the sign-in response's `Set-Cookie` lines
pub(crate) fn collect_auth_cookies(response: &HttpResponse) -> Result<String> {
    let mut pairs = Vec::with_capacity(AUTH_COOKIES.len());

    for wanted in AUTH_COOKIES {
        let value = response.set_cookies().find_map(|line| {
            let pair = line.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            (name.trim() == wanted && !value.is_empty()).then(|| value.to_string())
        });

        match value {
            Some(value) => pairs.push(format!("{}={}", wanted, value)),
            None => {
                return Err(SharePointError::Authentication(format!(
                    "Sign-in response did not set the {} cookie",
                    wanted
                )))
            }
        }
    }

    Ok(pairs.join("; "))
}

/// Text content of the first element whose local name is `local_name`
fn element_text<'a>(body: &'a str, local_name: &str) -> Option<&'a str> {
    let mut search_from = 0;

    while let Some(offset) = body[search_from..].find('<') {
        let start = search_from + offset;
        let tag_end = start + body[start..].find('>')?;
        let tag = &body[start + 1..tag_end];
        let name = tag.split_whitespace().next().unwrap_or_default();
        let local = name.rsplit(':').next().unwrap_or(name);

        if local == local_name && !name.starts_with('/') && !tag.ends_with('/') {
            let content_start = tag_end + 1;
            let close = format!("</{}>", name);
            let content_end = content_start + body[content_start..].find(&close)?;
            return Some(&body[content_start..content_end]);
        }

        search_from = tag_end + 1;
    }

    None
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn xml_unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
