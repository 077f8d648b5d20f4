//! Shared helpers for the lifecycle tests: a canned-response HTTP
//! server and a stub OCI runtime that emits a baseline spec.
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;

/// Baseline spec in the shape the real runtime generates, reduced to
/// the fields the patch touches plus a few passthrough ones.
pub const BASELINE_SPEC: &str = r#"{
    "ociVersion": "1.0.2",
    "process": {
        "terminal": true,
        "user": {"uid": 0, "gid": 0},
        "args": ["sh"],
        "cwd": "/"
    },
    "root": {"path": "rootfs", "readonly": true},
    "hostname": "runc",
    "mounts": [{"destination": "/proc", "type": "proc", "source": "proc"}]
}"#;

/// Serves the given path -> body map on a loopback port, forever, on a
/// detached thread. Unknown paths get a 404. Returns the base URL.
pub fn serve(routes: HashMap<String, Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind loopback listener");
    let addr = listener.local_addr().expect("failed to get listener addr");

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            // Drain headers so the client sees a well-formed exchange.
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(_) if header.trim_end().is_empty() => break,
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("");
            let mut stream = reader.into_inner();
            let _ = match routes.get(path) {
                Some(body) => stream
                    .write_all(
                        format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        )
                        .as_bytes(),
                    )
                    .and_then(|()| stream.write_all(body)),
                None => stream.write_all(
                    b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                ),
            };
        }
    });

    format!("http://{addr}")
}

/// Writes a stub runtime binary into `dir`: `spec` emits the baseline
/// `config.json` into the working directory, `fail` exits nonzero, and
/// anything else succeeds silently.
pub fn stub_runtime(dir: &Path) -> PathBuf {
    let path = dir.join("stub-runc");
    let script = format!(
        "#!/bin/sh\ncase \"$1\" in\nspec)\ncat > config.json <<'EOF'\n{BASELINE_SPEC}\nEOF\n;;\nfail)\nexit 1\n;;\nesac\n"
    );
    fs::write(&path, script).expect("failed to write stub runtime");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("failed to mark stub runtime executable");
    path
}

/// A gzip-compressed tar archive containing one file per entry.
pub fn gzipped_rootfs(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, body) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).expect("bad test entry path");
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append(&header, body.as_bytes())
            .expect("failed to append test entry");
    }
    let tarball = builder.into_inner().expect("failed to finish test tar");

    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(&tarball)
        .expect("failed to compress test tar");
    encoder.finish().expect("failed to finish test gzip")
}
