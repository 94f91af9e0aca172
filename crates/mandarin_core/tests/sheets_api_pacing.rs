use mandarin_core::config::SheetsCredentials;
use mandarin_core::grid::client::{GridClient, RequestPacer};
use mandarin_core::grid::layout::TEAM_SHEET_TITLE;
use mandarin_core::grid::sheets_api::SheetsApiClient;
use mandarin_core::grid::writer::SheetWriter;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const INTERVAL: Duration = Duration::from_millis(200);
const JITTER: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
struct Seen {
    at: Instant,
    method: String,
    target: String,
    body: String,
}

/// Minimal Sheets stand-in answering every request with canned JSON.
fn spawn_sheets_server() -> (String, Arc<Mutex<Vec<Seen>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            serve_one(stream, &log);
        }
    });
    (format!("http://{addr}"), seen)
}

fn serve_one(stream: TcpStream, log: &Mutex<Vec<Seen>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let at = Instant::now();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).expect("header line");
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().expect("content length");
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("request body");

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    let response_body = if method == "GET" && target.contains("fields=") {
        r#"{"sheets":[{"properties":{"sheetId":7,"title":"команды"}}]}"#
    } else if method == "GET" {
        r#"{"values":[["Owls"]]}"#
    } else {
        "{}"
    };
    log.lock().unwrap().push(Seen {
        at,
        method,
        target,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response_body.len(),
        response_body
    )
    .expect("write response");
    stream.flush().expect("flush response");
}

fn client(api_base: String) -> SheetsApiClient {
    SheetsApiClient::with_pacer(
        SheetsCredentials {
            spreadsheet_id: "sheet-under-test".to_string(),
            access_token: "token".to_string(),
            api_base,
        },
        RequestPacer::with_interval(INTERVAL),
    )
}

#[test]
fn every_sheets_request_waits_for_its_own_slot() {
    let (api_base, seen) = spawn_sheets_server();
    let client = client(api_base);
    let writer = SheetWriter::new(&client);

    writer.write_team_task_status(1, 1, true).unwrap();
    writer.write_team_task_status(1, 1, false).unwrap();
    let values = client.read_sheet(TEAM_SHEET_TITLE).unwrap();

    assert_eq!(values, vec![vec!["Owls".to_string()]]);
    let seen = seen.lock().unwrap().clone();
    let methods: Vec<&str> = seen.iter().map(|request| request.method.as_str()).collect();
    assert_eq!(methods, ["GET", "POST", "POST", "GET"]);
    for pair in seen.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(
            gap + JITTER >= INTERVAL,
            "{} {} followed {} {} after {:?}",
            pair[1].method,
            pair[1].target,
            pair[0].method,
            pair[0].target,
            gap
        );
    }
}

#[test]
fn status_write_sends_text_and_fill_in_one_batch() {
    let (api_base, seen) = spawn_sheets_server();
    let client = client(api_base);
    let writer = SheetWriter::new(&client);

    writer.write_team_task_status(1, 1, true).unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].target.contains("fields="));
    let update = &seen[1];
    assert!(update.target.ends_with(":batchUpdate"));
    assert!(update.body.contains("updateCells"));
    assert!(update.body.contains("Сделано"));
    assert!(update.body.contains("\"sheetId\":7"));
}
