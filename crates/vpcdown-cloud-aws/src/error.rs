//! EC2 error classification
//!
//! Maps EC2 API error codes onto the `CloudError` taxonomy using the SDK's
//! `.code()` metadata instead of string matching on the Debug format. The
//! orchestrator only needs to tell "already gone" from "still blocked" from
//! "throttled"; everything else is a plain API error.

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use vpcdown_cloud::CloudError;

/// Codes that mean the resource is already gone. EC2 mostly uses an
/// `Invalid*.NotFound` scheme, covered by the suffix check; these are the
/// stragglers that don't follow it.
const NOT_FOUND_CODES: &[&str] = &["Gateway.NotAttached", "InvalidParameterValue.NotFound"];

/// Known throttling/rate-limit codes
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Classify an EC2 SDK error into the teardown error taxonomy.
///
/// `resource_type` and `resource_id` describe the resource the failed call
/// was about, for not-found reporting.
pub(crate) fn classify<E>(
    err: SdkError<E>,
    resource_type: &'static str,
    resource_id: &str,
) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    classify_code(code.as_deref(), &message, resource_type, resource_id)
}

pub(crate) fn classify_code(
    code: Option<&str>,
    message: &str,
    resource_type: &'static str,
    resource_id: &str,
) -> CloudError {
    match code {
        Some(c) if c.ends_with(".NotFound") || NOT_FOUND_CODES.contains(&c) => {
            CloudError::NotFound {
                resource_type,
                resource_id: resource_id.to_string(),
            }
        }
        Some("DependencyViolation") => CloudError::DependencyViolation(message.to_string()),
        Some(c) if THROTTLING_CODES.contains(&c) => CloudError::Throttled(message.to_string()),
        Some(c) => CloudError::Api(format!("{c}: {message}")),
        None => CloudError::Api(message.to_string()),
    }
}
