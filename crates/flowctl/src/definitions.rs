//! Canned state machine definitions and payloads used by the demos.

use serde_json::{json, Value};

/// Name of the activity created by the hello-world demo.
pub const HELLO_ACTIVITY: &str = "demo-hello-world-activity";

/// Name of the state machine created by the hello-world demo.
pub const HELLO_MACHINE: &str = "demo-hello-world-machine";

/// Single Pass state returning a greeting.
pub fn hello_world_pass() -> Value {
    json!({
        "Comment": "A simple Hello World example",
        "StartAt": "HelloWorld",
        "States": {
            "HelloWorld": {
                "Type": "Pass",
                "Result": "Hello, World!",
                "End": true
            }
        }
    })
}

/// The updated definition: a greeting followed by a farewell.
pub fn hello_world_goodbye() -> Value {
    json!({
        "Comment": "An updated Hello World example",
        "StartAt": "HelloWorld",
        "States": {
            "HelloWorld": {
                "Type": "Pass",
                "Result": "Hello, World!",
                "Next": "GoodbyeWorld"
            },
            "GoodbyeWorld": {
                "Type": "Pass",
                "Result": "Goodbye, World!",
                "End": true
            }
        }
    })
}

/// Single Task state served by an external activity worker.
pub fn hello_world_activity(activity_arn: &str) -> Value {
    json!({
        "Comment": "A hello world example using an activity",
        "StartAt": "HelloWorldActivity",
        "States": {
            "HelloWorldActivity": {
                "Type": "Task",
                "Resource": activity_arn,
                "End": true
            }
        }
    })
}

/// Input for the hello-world execution.
pub fn hello_world_input() -> Value {
    json!({ "data": "Hello World!" })
}

/// Matches S3 API calls recorded by CloudTrail.
pub fn s3_cloudtrail_pattern() -> Value {
    json!({
        "source": ["aws.s3"],
        "detail-type": ["AWS API Call via CloudTrail"]
    })
}
