use axum::http::{header, HeaderMap};

/// Build a `Set-Cookie` value for the session cookie. A negative `max_age`
/// clears the cookie.
pub fn session_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = if max_age < 0 {
        format!("{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
    } else {
        format!("{name}={value}; Path=/; Max-Age={max_age}")
    };
    cookie.push_str("; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// First non-empty value of cookie `name` across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v)
}
