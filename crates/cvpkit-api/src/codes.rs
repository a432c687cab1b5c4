//! Controller error codes.
//!
//! The controller reports failures as `{"errorCode": N, "errorMessage": "..."}`.
//! Client-side conditions (timeouts, task failures, bad arguments) reuse the
//! same numeric space so every failure can be rendered uniformly.

pub const NO_ERROR_CODE: i64 = 0;
pub const UNKNOWN_ERROR_CODE: i64 = 1;
pub const UNKNOWN_REQUEST_RESPONSE: i64 = 2;
pub const INVALID_ARGUMENT: i64 = 3;
pub const TIMEOUT: i64 = 4;
pub const TASK_EXECUTION_ERROR: i64 = 5;
pub const INVALID_CONFIGLET_NAME: i64 = 1002;
pub const INVALID_CONFIGLET_TYPE: i64 = 1003;
pub const CONFIGLET_GENERATION_ERROR: i64 = 1004;
pub const INVALID_IMAGE_BUNDLE_NAME: i64 = 2002;
pub const INVALID_IMAGE_ADDITION: i64 = 2003;
pub const INVALID_CONTAINER_NAME: i64 = 3002;
pub const DEVICE_ALREADY_EXISTS: i64 = 4001;
pub const DEVICE_LOGIN_UNAUTHORISED: i64 = 4002;
pub const DEVICE_INVALID_LOGIN_CREDENTIALS: i64 = 4003;
pub const DEVICE_CONNECTION_ATTEMPT_FAILURE: i64 = 4005;
pub const INVALID_IMAGE_NAME: i64 = 5001;
pub const INVALID_ROLE_NAME: i64 = 6001;
pub const USER_UNAUTHORISED: i64 = 122_401;
pub const DATA_ALREADY_EXISTS: i64 = 122_518;
pub const CONFIGLET_ALREADY_EXISTS: i64 = 132_518;
pub const ENTITY_DOES_NOT_EXIST: i64 = 132_801;
pub const CONFIG_BUILDER_ALREADY_EXISTS: i64 = 132_823;
pub const IMAGE_BUNDLE_ALREADY_EXISTS: i64 = 162_518;
pub const CANNOT_DELETE_IMAGE_BUNDLE: i64 = 162_854;
pub const ROLE_ALREADY_EXISTS: i64 = 232_518;

static MESSAGES: &[(i64, &str)] = &[
    (NO_ERROR_CODE, "No error code provided"),
    (UNKNOWN_ERROR_CODE, "Unknown error code"),
    (UNKNOWN_REQUEST_RESPONSE, "Request response is not Json"),
    (INVALID_ARGUMENT, "Unsupported parameter type"),
    (TIMEOUT, "Timeout"),
    (TASK_EXECUTION_ERROR, "Task did not complete"),
    (INVALID_CONFIGLET_NAME, "Invalid Configlet name"),
    (INVALID_CONFIGLET_TYPE, "Configlet type is not correct"),
    (
        CONFIGLET_GENERATION_ERROR,
        "Unable to generate configlet using configlet builder",
    ),
    (INVALID_IMAGE_BUNDLE_NAME, "Invalid Image Bundle name"),
    (
        INVALID_IMAGE_ADDITION,
        "Image name or directory path containing image is incorrect",
    ),
    (INVALID_CONTAINER_NAME, "Invalid container name"),
    (DEVICE_ALREADY_EXISTS, "Device already exists"),
    (
        DEVICE_LOGIN_UNAUTHORISED,
        "User unauthorised to login into the device",
    ),
    (
        DEVICE_INVALID_LOGIN_CREDENTIALS,
        "Incorrect device login credentials",
    ),
    (
        DEVICE_CONNECTION_ATTEMPT_FAILURE,
        "Failure to setup connection with device",
    ),
    (INVALID_IMAGE_NAME, "Invalid Image Name"),
    (INVALID_ROLE_NAME, "Invalid Role Name"),
    (USER_UNAUTHORISED, "User unauthorised to perform this action"),
    (DATA_ALREADY_EXISTS, "Data already exists in Database"),
    (CONFIGLET_ALREADY_EXISTS, "Configlet already exists"),
    (ENTITY_DOES_NOT_EXIST, "Entity does not exist"),
    (CONFIG_BUILDER_ALREADY_EXISTS, "Configlet Builder already exists"),
    (IMAGE_BUNDLE_ALREADY_EXISTS, "Image bundle already exists"),
    (
        CANNOT_DELETE_IMAGE_BUNDLE,
        "image bundle is applied to object in cvp",
    ),
    (ROLE_ALREADY_EXISTS, "Role already exists"),
];

/// Default human-readable message for a code.
pub fn describe(code: i64) -> String {
    MESSAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or_else(
            || format!("Unknown Error Code: {code}"),
            |(_, msg)| (*msg).to_owned(),
        )
}

/// Codes meaning "an entity with that name already exists".
pub fn is_conflict(code: i64) -> bool {
    matches!(
        code,
        DATA_ALREADY_EXISTS
            | CONFIGLET_ALREADY_EXISTS
            | CONFIG_BUILDER_ALREADY_EXISTS
            | IMAGE_BUNDLE_ALREADY_EXISTS
            | ROLE_ALREADY_EXISTS
            | DEVICE_ALREADY_EXISTS
    )
}

/// Codes meaning the referenced entity could not be resolved.
pub fn is_not_found(code: i64) -> bool {
    matches!(
        code,
        ENTITY_DOES_NOT_EXIST
            | INVALID_CONFIGLET_NAME
            | INVALID_IMAGE_BUNDLE_NAME
            | INVALID_CONTAINER_NAME
            | INVALID_IMAGE_NAME
            | INVALID_ROLE_NAME
    )
}
