//! Static file serving of the staging tree.
//!
//! Every directory in the tree carries an `index.html`, so a directory
//! request serves that page rather than any generated listing. Keep-alives
//! are not supported: every response carries `Connection: close` and the
//! socket is closed as soon as the body is written. Responses are serialized
//! straight onto the TCP stream; each connection answers exactly one GET.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::shutdown::ShutdownFlag;

/// How often the accept loop checks the shutdown flag while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Read/write timeout per client connection, so a stalled client cannot pin
/// its handler thread forever.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve `root` on `0.0.0.0:<port>` until `shutdown` triggers.
///
/// Bind and accept errors are fatal; I/O errors on an individual connection
/// are logged and the next request is served (the client may simply have
/// gone away).
pub fn serve(root: &Path, port: u16, shutdown: &ShutdownFlag) -> Result<()> {
    let listener =
        TcpListener::bind(("0.0.0.0", port)).with_context(|| format!("binding 0.0.0.0:{port}"))?;
    run(&listener, root, shutdown)
}

fn run(listener: &TcpListener, root: &Path, shutdown: &ShutdownFlag) -> Result<()> {
    listener
        .set_nonblocking(true)
        .context("configuring listener")?;

    while !shutdown.is_triggered() {
        let stream = match listener.accept() {
            Ok((stream, _)) => stream,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(err) => return Err(err).context("accepting connection"),
        };

        let root = root.to_path_buf();
        thread::spawn(move || {
            if let Err(err) = handle_connection(stream, &root) {
                eprintln!("[serve] request failed: {err:#}");
            }
        });
    }
    Ok(())
}

/// Answer a single request; dropping the stream on return closes the socket,
/// regardless of what `Connection` behavior the client asked for.
fn handle_connection(stream: TcpStream, root: &Path) -> Result<()> {
    stream
        .set_nonblocking(false)
        .context("configuring connection")?;
    stream
        .set_read_timeout(Some(CLIENT_TIMEOUT))
        .context("configuring connection")?;
    stream
        .set_write_timeout(Some(CLIENT_TIMEOUT))
        .context("configuring connection")?;

    let mut reader = BufReader::new(stream.try_clone().context("cloning connection")?);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .context("reading request line")?;
    // Drain the header block so the client has finished sending before the
    // response goes out.
    loop {
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .context("reading request headers")?;
        if read == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let (method, url) = match (parts.next(), parts.next()) {
        (Some(method), Some(url)) => (method, url),
        _ => return send_text(stream, 400, "bad request\n"),
    };
    if method != "GET" {
        return send_text(stream, 405, "method not allowed\n");
    }

    let Some(mut path) = resolve(root, url) else {
        return send_text(stream, 404, "404 not found\n");
    };
    if path.is_dir() {
        path.push("index.html");
    }

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(_) => return send_text(stream, 404, "404 not found\n"),
    };
    let length = file
        .metadata()
        .with_context(|| format!("reading metadata of '{}'", path.display()))?
        .len();
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    send(stream, 200, mime.as_ref(), length, file)
}

/// Map a request URL onto a path under `root`.
///
/// Query strings are ignored; `..` components are rejected rather than
/// resolved, so the result can never escape the tree.
fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let mut resolved = root.to_path_buf();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            part => resolved.push(part),
        }
    }
    Some(resolved)
}

fn send_text(stream: TcpStream, status: u16, body: &str) -> Result<()> {
    send(
        stream,
        status,
        "text/plain; charset=utf-8",
        body.len() as u64,
        body.as_bytes(),
    )
}

fn send<R: Read>(
    mut stream: TcpStream,
    status: u16,
    content_type: &str,
    length: u64,
    mut body: R,
) -> Result<()> {
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {length}\r\n\
         Connection: close\r\n\r\n",
        reason = reason(status),
    )
    .context("writing response header")?;
    io::copy(&mut body, &mut stream).context("writing response body")?;
    stream.flush().context("flushing response")?;
    Ok(())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "",
    }
}
