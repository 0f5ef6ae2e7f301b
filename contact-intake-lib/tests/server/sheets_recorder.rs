use contact_intake_lib::config::SheetsConfig;
use contact_intake_lib::intake::{SubmissionRecord, ValidSubmission};
use contact_intake_lib::recorder::HEADER_ROW;
use contact_intake_lib::{Recorder, RecorderError, SheetsRecorder};
use chrono::{TimeZone, Utc};
use http::header::AUTHORIZATION;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug)]
struct Captured {
    method: Method,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
    body: Value,
}

/// Minimal stand-in for the Sheets values API answering every request with `status`.
async fn spawn_sheets_api(
    status: StatusCode,
) -> std::io::Result<(SocketAddr, mpsc::UnboundedReceiver<Captured>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let svc = service_fn(move |req: Request<Incoming>| {
                    let tx = tx.clone();
                    async move {
                        let method = req.method().clone();
                        let path = req.uri().path().to_string();
                        let query = req.uri().query().map(str::to_string);
                        let authorization = req
                            .headers()
                            .get(AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let bytes = req.into_body().collect().await?.to_bytes();
                        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                        let _ = tx.send(Captured { method, path, query, authorization, body });

                        let mut resp = Response::new(Full::new(Bytes::from_static(b"{}")));
                        *resp.status_mut() = status;
                        Ok::<_, hyper::Error>(resp)
                    }
                });
                let _ = http1::Builder::new().serve_connection(TokioIo::new(stream), svc).await;
            });
        }
    });

    Ok((addr, rx))
}

fn config(addr: SocketAddr) -> SheetsConfig {
    SheetsConfig {
        spreadsheet_id: Some("sheet-1".to_string()),
        access_token: Some("test-token".to_string()),
        api_base: format!("http://{addr}"),
        ..SheetsConfig::default()
    }
}

fn record() -> SubmissionRecord {
    let submission = ValidSubmission {
        name: "Jo Smith".to_string(),
        email: "JO@Example.com".to_string(),
        phone: None,
        project_type: Some("Website".to_string()),
        budget: None,
        timeline: None,
        message: "Hello".to_string(),
    };
    let at = Utc
        .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid timestamp"));
    SubmissionRecord::new(submission, "id-1".to_string(), "1.2.3.4".to_string(), at)
}

#[tokio::test]
async fn test_record_appends_row() -> TestResult {
    let (addr, mut requests) = spawn_sheets_api(StatusCode::OK).await?;
    let recorder = SheetsRecorder::new(config(addr))?;

    recorder.record(&record()).await?;

    let captured = requests.recv().await.ok_or("no request captured")?;
    assert_eq!(captured.method, Method::POST);
    assert_eq!(captured.path, "/v4/spreadsheets/sheet-1/values/Sheet1!A:I:append");
    assert_eq!(captured.query.as_deref(), Some("valueInputOption=RAW"));
    assert_eq!(captured.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(
        captured.body,
        serde_json::json!({"values": [[
            "2026-03-01T12:00:00.000Z",
            "Jo Smith",
            "jo@example.com",
            "",
            "Website",
            "",
            "",
            "Hello",
            "1.2.3.4"
        ]]})
    );
    Ok(())
}

#[tokio::test]
async fn test_initialize_sheet_writes_header_row() -> TestResult {
    let (addr, mut requests) = spawn_sheets_api(StatusCode::OK).await?;
    let recorder = SheetsRecorder::new(config(addr))?;

    recorder.initialize_sheet().await?;

    let captured = requests.recv().await.ok_or("no request captured")?;
    assert_eq!(captured.method, Method::PUT);
    assert_eq!(captured.path, "/v4/spreadsheets/sheet-1/values/Sheet1!A1:I1");
    assert_eq!(captured.body, serde_json::json!({"values": [HEADER_ROW]}));
    Ok(())
}

#[tokio::test]
async fn test_api_error_status_reported() -> TestResult {
    let (addr, _requests) = spawn_sheets_api(StatusCode::FORBIDDEN).await?;
    let recorder = SheetsRecorder::new(config(addr))?;

    match recorder.record(&record()).await {
        Err(RecorderError::Rejected { status, .. }) => assert_eq!(status, 403),
        other => return Err(format!("expected rejection, got {other:?}").into()),
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_token_fails_without_request() -> TestResult {
    let (addr, mut requests) = spawn_sheets_api(StatusCode::OK).await?;
    let recorder =
        SheetsRecorder::new(SheetsConfig { access_token: None, ..config(addr) })?;

    assert!(!recorder.is_configured());
    let result = recorder.record(&record()).await;
    assert!(matches!(result, Err(RecorderError::NotConfigured(_))));
    assert!(requests.try_recv().is_err());
    Ok(())
}
