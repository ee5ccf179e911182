//! SOAP client for the QlikView Management Service (QMS API v11)

use super::xml::{self, Element};
use super::{
    ExecutionStatus, QmsApi, ServiceKey, StartResult, TaskDescriptor, TriggerOutcome,
    TriggerParams,
};
use crate::Result;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Management service endpoint used when none is configured
pub const DEFAULT_ADDRESS: &str = "http://localhost:4799/QMS/Service";

const QMS_NAMESPACE: &str = "http://ws.qliktech.com/QMS/11/";
const ARRAYS_NAMESPACE: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";
const SERVICE_KEY_HEADER: &str = "X-Service-Key";
/// Lets the server pick the distribution service
const ANY_QDS: &str = "00000000-0000-0000-0000-000000000000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client bound to one management service address
pub struct QmsClient {
    http: Client,
    address: String,
}

impl QmsClient {
    /// Create a client for the given service address
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("qv-edx-trigger/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            address: address.into(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Invoke one operation and return its `<Operation>Result` element
    async fn call(
        &self,
        operation: &str,
        arguments: &str,
        key: Option<&ServiceKey>,
    ) -> Result<Element> {
        log::debug!("QMS {} -> {}", operation, self.address);

        let mut request = self
            .http
            .post(&self.address)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}IQMS/{}\"", QMS_NAMESPACE, operation))
            .body(envelope(operation, arguments));

        if let Some(key) = key {
            request = request.header(SERVICE_KEY_HEADER, key.as_str());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} request to {} failed", operation, self.address))?;
        let status = response.status();
        let body = response.text().await?;

        let document = xml::parse(&body);

        if let Ok(doc) = &document {
            if let Some(fault) = doc.find("Fault") {
                let reason = fault
                    .find("faultstring")
                    .or_else(|| fault.find("Text"))
                    .map(|e| e.text.as_str())
                    .unwrap_or("SOAP fault");
                anyhow::bail!("{}: {}", operation, reason);
            }
        }

        if !status.is_success() {
            anyhow::bail!("{} returned HTTP {}", operation, status);
        }

        let doc = document.with_context(|| format!("{} returned malformed XML", operation))?;
        let result_name = format!("{}Result", operation);
        doc.find(&result_name)
            .cloned()
            .ok_or_else(|| anyhow!("{} response has no {} element", operation, result_name))
    }
}

#[async_trait]
impl QmsApi for QmsClient {
    async fn service_key(&self) -> Result<ServiceKey> {
        let result = self.call("GetTimeLimitedServiceKey", "", None).await?;
        if result.nil || result.text.is_empty() {
            anyhow::bail!("GetTimeLimitedServiceKey returned an empty key");
        }
        Ok(ServiceKey::new(result.text))
    }

    async fn find_edx(&self, key: &ServiceKey, name: &str) -> Result<Vec<TaskDescriptor>> {
        let arguments = field("edxTaskName", name);
        let result = self.call("FindEDX", &arguments, Some(key)).await?;
        Ok(result
            .children_named("TaskInfo")
            .filter_map(decode_task)
            .collect())
    }

    async fn get_task(&self, key: &ServiceKey, id: &str) -> Result<Option<TaskDescriptor>> {
        let arguments = field("taskID", bare_guid(id));
        let result = self.call("GetTask", &arguments, Some(key)).await?;
        Ok(decode_task(&result))
    }

    async fn trigger_edx_task(
        &self,
        key: &ServiceKey,
        params: &TriggerParams,
    ) -> Result<TriggerOutcome> {
        let result = self
            .call("TriggerEDXTask", &trigger_arguments(params), Some(key))
            .await?;
        decode_trigger(&result)
    }

    async fn edx_task_status(&self, key: &ServiceKey, exec_id: &str) -> Result<ExecutionStatus> {
        let arguments = format!("{}{}", field("qdsID", ANY_QDS), field("executionID", exec_id));
        let result = self.call("GetEDXTaskStatus", &arguments, Some(key)).await?;
        decode_status(&result)
    }
}

fn envelope(operation: &str, arguments: &str) -> String {
    format!(
        concat!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<s:Body><{op} xmlns="{ns}">{args}</{op}></s:Body></s:Envelope>"#
        ),
        op = operation,
        ns = QMS_NAMESPACE,
        args = arguments
    )
}

fn field(name: &str, value: &str) -> String {
    format!("<{0}>{1}</{0}>", name, xml::escape(value))
}

/// GUIDs travel without braces
fn bare_guid(id: &str) -> &str {
    id.trim().trim_start_matches('{').trim_end_matches('}')
}

fn trigger_arguments(params: &TriggerParams) -> String {
    let mut arguments = field("qdsID", ANY_QDS);
    arguments.push_str(&field("taskNameOrID", &params.task_name));

    if let Some(password) = &params.password {
        arguments.push_str(&field("password", password));
    }
    if let Some(variable) = &params.variable_name {
        arguments.push_str(&field("variableName", variable));
    }
    if !params.variable_values.is_empty() {
        arguments.push_str(&format!(
            r#"<variableValues xmlns:a="{}">"#,
            ARRAYS_NAMESPACE
        ));
        for value in &params.variable_values {
            arguments.push_str(&format!("<a:string>{}</a:string>", xml::escape(value)));
        }
        arguments.push_str("</variableValues>");
    }

    arguments
}

/// A task without a name is unknown to the service
fn decode_task(element: &Element) -> Option<TaskDescriptor> {
    if element.nil {
        return None;
    }
    let name = element.value("Name")?;

    Some(TaskDescriptor {
        name: name.to_string(),
        id: element.value("ID").unwrap_or_default().to_string(),
        qds_id: element.value("QDSID").unwrap_or_default().to_string(),
        enabled: element
            .value("Enabled")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    })
}

fn decode_trigger(element: &Element) -> Result<TriggerOutcome> {
    let start = element
        .value("EDXTaskStartResult")
        .ok_or_else(|| anyhow!("TriggerEDXTask response has no EDXTaskStartResult"))?;

    match StartResult::from(start) {
        StartResult::Success => {
            let exec_id = element
                .value("ExecId")
                .ok_or_else(|| anyhow!("TriggerEDXTask succeeded without an ExecId"))?;
            Ok(TriggerOutcome::Started {
                exec_id: exec_id.to_string(),
            })
        }
        rejected => Ok(TriggerOutcome::Rejected(rejected)),
    }
}

fn decode_status(element: &Element) -> Result<ExecutionStatus> {
    if element.nil {
        anyhow::bail!("GetEDXTaskStatus returned no status");
    }
    let status = element
        .value("TaskStatus")
        .ok_or_else(|| anyhow!("GetEDXTaskStatus response has no TaskStatus"))?;

    Ok(ExecutionStatus {
        status: status.parse()?,
        start_time: element.value("StartTime").map(str::to_string),
        finish_time: element.value("FinishTime").map(str::to_string),
        log_file: element.value("LogFileFullPath").map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qms::TaskStatus;

    fn result_of(body: &str) -> Element {
        xml::parse(body).unwrap().children.remove(0)
    }

    #[test]
    fn test_envelope_escapes_arguments() {
        let body = envelope("FindEDX", &field("edxTaskName", "Sales <EU>"));
        assert!(body.contains(r#"<FindEDX xmlns="http://ws.qliktech.com/QMS/11/">"#));
        assert!(body.contains("<edxTaskName>Sales &lt;EU&gt;</edxTaskName>"));
        assert!(xml::parse(&body).is_ok());
    }

    #[test]
    fn test_trigger_arguments() {
        let params = TriggerParams {
            task_name: "Nightly".to_string(),
            password: None,
            variable_name: Some("Region".to_string()),
            variable_values: vec!["EU".to_string(), "US".to_string()],
        };
        let args = trigger_arguments(&params);

        assert!(args.starts_with(&format!("<qdsID>{}</qdsID>", ANY_QDS)));
        assert!(args.contains("<taskNameOrID>Nightly</taskNameOrID>"));
        assert!(!args.contains("<password>"));
        assert!(args.contains("<variableName>Region</variableName>"));
        assert!(args.contains("<a:string>EU</a:string><a:string>US</a:string>"));
    }

    #[test]
    fn test_bare_guid() {
        assert_eq!(
            bare_guid("{3F2504E0-4F89-11D3-9A0C-0305E82C3301}"),
            "3F2504E0-4F89-11D3-9A0C-0305E82C3301"
        );
    }

    #[test]
    fn test_decode_task_list() {
        let doc = xml::parse(
            r#"<FindEDXResult xmlns:a="x">
                 <a:TaskInfo><a:Enabled>true</a:Enabled><a:ID>1</a:ID><a:Name>Nightly</a:Name><a:QDSID>q1</a:QDSID></a:TaskInfo>
                 <a:TaskInfo><a:Enabled>false</a:Enabled><a:ID>2</a:ID><a:Name>Nightly</a:Name><a:QDSID>q2</a:QDSID></a:TaskInfo>
               </FindEDXResult>"#,
        )
        .unwrap();
        let result = &doc.children[0];
        let tasks: Vec<_> = result.children_named("TaskInfo").filter_map(decode_task).collect();

        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].enabled);
        assert_eq!(tasks[1].qds_id, "q2");
        assert!(!tasks[1].enabled);
    }

    #[test]
    fn test_decode_task_without_name() {
        let result = result_of(
            r#"<GetTaskResult xmlns:i="http://www.w3.org/2001/XMLSchema-instance"><Name i:nil="true"/><ID>00000000-0000-0000-0000-000000000000</ID></GetTaskResult>"#,
        );
        assert_eq!(decode_task(&result), None);
    }

    #[test]
    fn test_decode_trigger() {
        let started = result_of(
            "<TriggerEDXTaskResult><EDXTaskStartResult>Success</EDXTaskStartResult><ExecId>e-1</ExecId></TriggerEDXTaskResult>",
        );
        assert_eq!(
            decode_trigger(&started).unwrap(),
            TriggerOutcome::Started {
                exec_id: "e-1".to_string()
            }
        );

        let rejected = result_of(
            "<TriggerEDXTaskResult><EDXTaskStartResult>TaskIsAlreadyRunning</EDXTaskStartResult><ExecId>00000000-0000-0000-0000-000000000000</ExecId></TriggerEDXTaskResult>",
        );
        assert_eq!(
            decode_trigger(&rejected).unwrap(),
            TriggerOutcome::Rejected(StartResult::Other("TaskIsAlreadyRunning".to_string()))
        );
    }

    #[test]
    fn test_decode_status() {
        let result = result_of(
            r#"<GetEDXTaskStatusResult>
                 <FinishTime>2024-03-01 10:05:00</FinishTime>
                 <LogFileFullPath>C:\Logs\task.log</LogFileFullPath>
                 <StartTime>2024-03-01 10:00:00</StartTime>
                 <TaskStatus>Warning</TaskStatus>
               </GetEDXTaskStatusResult>"#,
        );
        let status = decode_status(&result).unwrap();

        assert_eq!(status.status, TaskStatus::Warning);
        assert_eq!(status.start_time.as_deref(), Some("2024-03-01 10:00:00"));
        assert_eq!(status.log_file.as_deref(), Some(r"C:\Logs\task.log"));
    }

    #[test]
    fn test_client_keeps_address() {
        let client = QmsClient::new("http://qv:4799/QMS/Service").unwrap();
        assert_eq!(client.address(), "http://qv:4799/QMS/Service");
    }
}
