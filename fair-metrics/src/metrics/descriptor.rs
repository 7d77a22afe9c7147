//! Swagger 2.0 descriptor served on `GET /tests/{metric_path}`
//!
//! FAIR evaluators read this document to register the metric test.

use super::MetricInfo;
use fair_common::Settings;
use serde_json::{json, Value};

pub const YAML_CONTENT_TYPE: &str = "text/x-yaml";

pub fn swagger_descriptor(info: &MetricInfo, settings: &Settings) -> Value {
    json!({
        "swagger": "2.0",
        "info": {
            "version": info.metric_version,
            "title": info.title,
            "x-tests_metric": format!("{}/tests/{}", settings.host_url.trim_end_matches('/'), info.metric_path),
            "description": info.description,
            "x-applies_to_principle": info.applies_to_principle,
            "x-topics": info.topics,
            "contact": {
                "x-organization": settings.org_name,
                "url": settings.contact_url,
                "name": settings.contact_name,
                "x-role": "responsible developer",
                "email": settings.contact_email,
                "x-id": info.author,
            }
        },
        "host": settings.host,
        "basePath": "/tests/",
        "schemes": ["https"],
        "paths": {
            (info.metric_path): {
                "post": {
                    "parameters": [{
                        "name": "content",
                        "in": "body",
                        "required": true,
                        "schema": {"$ref": "#/definitions/schemas"}
                    }],
                    "consumes": ["application/json"],
                    "produces": ["application/json"],
                    "responses": {
                        "200": {"description": "The response is a binary (1/0), success or failure"}
                    }
                }
            }
        },
        "definitions": {
            "schemas": {
                "required": ["subject"],
                "properties": {
                    "subject": {
                        "type": "string",
                        "description": "the GUID being tested"
                    }
                }
            }
        }
    })
}

/// The descriptor rendered as YAML
pub fn swagger_yaml(info: &MetricInfo, settings: &Settings) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&swagger_descriptor(info, settings))
}
