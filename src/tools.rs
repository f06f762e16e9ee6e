// Tool-invocation surface: every façade operation as a named,
// schema-described callable. Results are pretty-printed JSON text; failures
// collapse into an "Error: ..." text payload, the only failure shape the
// text-based tool transport can carry.

use crate::service::DockerService;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn no_args_schema() -> Value {
    json!({ "type": "object", "properties": {}, "required": [] })
}

fn container_id_schema(extra: Value) -> Value {
    let mut properties = json!({
        "container_id": {
            "type": "string",
            "description": "Container ID or name",
        }
    });
    if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            props.insert(k.clone(), v.clone());
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["container_id"],
    })
}

pub fn list_tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "docker_health",
            description: "Get Docker daemon health and system information including container counts, memory and CPU",
            input_schema: no_args_schema(),
        },
        ToolDef {
            name: "docker_version",
            description: "Get Docker version information",
            input_schema: no_args_schema(),
        },
        ToolDef {
            name: "list_containers",
            description: "List Docker containers with status, image and port information",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "all": {
                        "type": "boolean",
                        "description": "Include stopped containers (default: true)",
                        "default": true,
                    }
                },
                "required": [],
            }),
        },
        ToolDef {
            name: "get_container",
            description: "Get detailed information about a specific container",
            input_schema: container_id_schema(json!({})),
        },
        ToolDef {
            name: "get_container_logs",
            description: "Get logs from a specific container",
            input_schema: container_id_schema(json!({
                "tail": {
                    "type": "integer",
                    "description": "Number of lines to return from the end (default: 100)",
                    "default": 100,
                }
            })),
        },
        ToolDef {
            name: "get_container_stats",
            description: "Get resource usage statistics (CPU, memory, network, block I/O) for a container",
            input_schema: container_id_schema(json!({})),
        },
        ToolDef {
            name: "list_images",
            description: "List Docker images with their tags and sizes",
            input_schema: no_args_schema(),
        },
    ]
}

/// Dispatch one tool call and render the result as text.
pub async fn call_tool(service: &DockerService, name: &str, arguments: &Value) -> String {
    debug!(tool = name, "tool called");
    let result = dispatch(service, name, arguments).await;
    match result {
        Ok(Some(value)) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {e}"))
        }
        Ok(None) => format!("Unknown tool: {name}"),
        Err(message) => message,
    }
}

async fn dispatch(
    service: &DockerService,
    name: &str,
    arguments: &Value,
) -> Result<Option<Value>, String> {
    let value = match name {
        "docker_health" => to_value(service.get_system_info().await)?,
        "docker_version" => to_value(service.get_version().await)?,
        "list_containers" => {
            let all = arguments.get("all").and_then(Value::as_bool).unwrap_or(true);
            to_value(service.list_containers(all).await)?
        }
        "get_container" => {
            let id = required_str(arguments, "container_id")?;
            to_value(service.get_container_details(id).await)?
        }
        "get_container_logs" => {
            let id = required_str(arguments, "container_id")?;
            let tail = arguments
                .get("tail")
                .and_then(Value::as_u64)
                .map(|t| t as u32)
                .unwrap_or(100);
            to_value(service.get_logs(id, tail).await)?
        }
        "get_container_stats" => {
            let id = required_str(arguments, "container_id")?;
            to_value(service.get_container_stats(id).await)?
        }
        "list_images" => to_value(service.list_images().await)?,
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Error: missing required argument: {key}"))
}

fn to_value<T: Serialize>(
    result: Result<T, crate::error::GatewayError>,
) -> Result<Value, String> {
    let ok = result.map_err(|e| format!("Error: {e}"))?;
    serde_json::to_value(&ok).map_err(|e| format!("Error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_registry_names_and_required_fields() {
        let tools = list_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "docker_health",
                "docker_version",
                "list_containers",
                "get_container",
                "get_container_logs",
                "get_container_stats",
                "list_images",
            ]
        );
        let get_container = tools.iter().find(|t| t.name == "get_container").unwrap();
        assert_eq!(
            get_container.input_schema["required"],
            serde_json::json!(["container_id"])
        );
    }

    #[test]
    fn tool_defs_serialize_with_camel_case_schema_key() {
        let json = serde_json::to_string(&list_tools()[0]).unwrap();
        assert!(json.contains("\"inputSchema\""));
    }
}
