//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The CSP is locked
//! down except for the two third-party origins the storefront needs: the
//! catalog's image host and the hosted checkout page.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, CONTENT_TYPE, REFERRER_POLICY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::config::StorefrontConfig;

/// Policy used if the configured one cannot be encoded as a header.
const FALLBACK_CSP: &str = "default-src 'none'; \
     script-src 'self'; \
     style-src 'self'; \
     img-src 'self'; \
     form-action 'self'; \
     frame-ancestors 'none'";

/// Precomputed header values for [`security_headers_middleware`].
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    csp: HeaderValue,
}

impl SecurityHeaders {
    /// Build the header set for the configured upstream origins.
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        let policy = build_csp(
            &config.catalog.api_url.origin().ascii_serialization(),
            &config.checkout.hosted_url.origin().ascii_serialization(),
            config.is_secure(),
        );
        let csp = HeaderValue::from_str(&policy).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid CSP, using fallback");
            HeaderValue::from_static(FALLBACK_CSP)
        });
        Self { csp }
    }
}

/// Assemble the CSP.
///
/// ```text
/// default-src 'none';
/// script-src 'self';
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' <catalog origin>;
/// connect-src 'self';
/// frame-src 'none';
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self' <checkout origin>;
/// frame-ancestors 'none';
/// upgrade-insecure-requests        (HTTPS deployments only)
/// ```
///
/// `form-action` must allow the hosted checkout origin because browsers
/// apply it to the redirect that follows the checkout form submission.
fn build_csp(image_origin: &str, checkout_origin: &str, secure: bool) -> String {
    let mut directives = vec![
        "default-src 'none'".to_string(),
        "script-src 'self'".to_string(),
        "style-src 'self'".to_string(),
        "font-src 'self'".to_string(),
        format!("img-src 'self' {image_origin}"),
        "connect-src 'self'".to_string(),
        "frame-src 'none'".to_string(),
        "object-src 'none'".to_string(),
        "base-uri 'self'".to_string(),
        format!("form-action 'self' {checkout_origin}"),
        "frame-ancestors 'none'".to_string(),
    ];
    if secure {
        directives.push("upgrade-insecure-requests".to_string());
    }
    directives.join("; ")
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - See [`SecurityHeaders`]
/// - `Permissions-Policy` - Deny all sensitive features
/// - `Cache-Control: no-store, max-age=0` - HTML only, pages are per-visitor
///   while static assets are cache-busted by content hash
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
/// - `Cross-Origin-Embedder-Policy: credentialless` - Allows catalog images
///   served without CORP headers
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
pub async fn security_headers_middleware(
    State(security): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, security.csp.clone());

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             camera=(), \
             display-capture=(), \
             fullscreen=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if is_html(headers) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("text/html"))
}
