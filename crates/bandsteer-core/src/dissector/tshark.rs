use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::error::DissectorError;
use super::layout::{self, FIELD_COUNT};
use super::reader;
use super::{CaptureRecord, RecordSource};

/// [`RecordSource`] backed by an external `tshark`-compatible dissector
/// binary, invoked once per capture with `-T fields` and one `-e <field>`
/// per entry in [`layout::FIELDS`].
///
/// The child's stdout is read one line at a time so the whole capture is
/// never buffered in memory; a watchdog thread enforces the wall-clock
/// timeout and kills the child on expiry.
pub struct TsharkSource {
    child: Arc<Mutex<Child>>,
    lines: mpsc::Receiver<std::io::Result<String>>,
    timed_out: Arc<AtomicBool>,
    timeout_s: u64,
    done_tx: mpsc::Sender<()>,
}

impl TsharkSource {
    /// Spawns the dissector against `path`, requesting the wire fields in
    /// [`layout::FIELDS`]. `binary` is typically `"tshark"`;
    /// `timeout` bounds the whole run per the 300s minimum in the spec.
    pub fn spawn(binary: &str, path: &Path, timeout: Duration) -> Result<Self, DissectorError> {
        let mut cmd = Command::new(binary);
        cmd.arg("-r")
            .arg(path)
            .arg("-T")
            .arg("fields")
            .arg("-E")
            .arg("separator=/t")
            .arg("-E")
            .arg("occurrence=f");
        for field in layout::FIELDS {
            cmd.arg("-e").arg(field);
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                DissectorError::Unavailable {
                    binary: binary.to_string(),
                }
            } else {
                DissectorError::Io(err)
            }
        })?;

        let stdout = child.stdout.take().expect("piped stdout");
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let child = Arc::new(Mutex::new(child));
        let timed_out = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let watchdog_child = Arc::clone(&child);
        let watchdog_flag = Arc::clone(&timed_out);
        thread::spawn(move || {
            if done_rx.recv_timeout(timeout).is_err() {
                watchdog_flag.store(true, Ordering::SeqCst);
                if let Ok(mut child) = watchdog_child.lock() {
                    let _ = child.kill();
                }
            }
        });

        Ok(Self {
            child,
            lines: rx,
            timed_out,
            timeout_s: timeout.as_secs(),
            done_tx,
        })
    }

    fn finish(&mut self) -> Result<(), DissectorError> {
        let status = {
            let mut child = self
                .child
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            child.wait()?
        };
        let _ = self.done_tx.send(());

        if self.timed_out.load(Ordering::SeqCst) {
            return Err(DissectorError::Timeout {
                timeout_s: self.timeout_s,
            });
        }
        if !status.success() {
            let mut stderr = String::new();
            {
                let mut child = self
                    .child
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                if let Some(mut err) = child.stderr.take() {
                    use std::io::Read;
                    let _ = err.read_to_string(&mut stderr);
                }
            }
            return Err(DissectorError::Failed {
                status: status.code().unwrap_or(-1),
                stderr: stderr.lines().next().unwrap_or("").to_string(),
            });
        }
        Ok(())
    }
}

impl RecordSource for TsharkSource {
    fn next_record(&mut self) -> Result<Option<CaptureRecord>, DissectorError> {
        loop {
            match self.lines.recv() {
                Ok(Ok(line)) => {
                    if let Some(record) = parse_line(&line) {
                        return Ok(Some(record));
                    }
                    // Records with no usable fields are skipped silently.
                }
                Ok(Err(err)) => return Err(DissectorError::Io(err)),
                Err(_) => {
                    self.finish()?;
                    return Ok(None);
                }
            }
        }
    }
}

/// Parses one tab-separated dissector output line into a [`CaptureRecord`],
/// applying the normalization rules in `reader`. Returns `None` when the
/// line has no timestamp or subtype — the two fields every downstream
/// component depends on.
fn parse_line(line: &str) -> Option<CaptureRecord> {
    let mut fields: Vec<&str> = line.split('\t').collect();
    fields.resize(FIELD_COUNT, "");

    let timestamp = reader::parse_opt_f64(fields[layout::IDX_TIME_EPOCH])?;
    let subtype_raw = reader::parse_opt_int(fields[layout::IDX_TYPE_SUBTYPE])?;
    let subtype = reader::normalize_subtype(subtype_raw);

    let frequency =
        reader::parse_opt_f64(fields[layout::IDX_FREQUENCY]).map(reader::normalize_frequency);

    Some(CaptureRecord {
        timestamp,
        subtype,
        bssid: reader::parse_opt_str(fields[layout::IDX_BSSID]).map(|m| reader::normalize_mac(&m)),
        sa: reader::parse_opt_str(fields[layout::IDX_SA]).map(|m| reader::normalize_mac(&m)),
        da: reader::parse_opt_str(fields[layout::IDX_DA]).map(|m| reader::normalize_mac(&m)),
        frequency,
        rssi: reader::parse_opt_f64(fields[layout::IDX_SIGNAL_DBM]),
        ssid: reader::parse_opt_str(fields[layout::IDX_SSID]),
        reason_code: reader::parse_opt_int(fields[layout::IDX_REASON_CODE]),
        category_code: reader::parse_opt_int(fields[layout::IDX_CATEGORY_CODE]),
        action_code: reader::parse_opt_int(fields[layout::IDX_ACTION_CODE]),
        btm_status_code: reader::parse_opt_int(fields[layout::IDX_BTM_STATUS_CODE]),
        assoc_status_code: reader::parse_opt_int(fields[layout::IDX_ASSOC_STATUS_CODE]),
        frame_len: reader::parse_opt_int(fields[layout::IDX_FRAME_LEN]).unwrap_or(0) as u64,
        protocols: fields[layout::IDX_PROTOCOLS].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_line() {
        let line = "1.5\twlan\t120\t13\taa:aa:aa:aa:aa:aa\taa:aa:aa:aa:aa:aa\t11:22:33:44:55:66\t5180\t\t\t10\t7\t\t\t-42";
        let rec = parse_line(line).expect("valid record");
        assert_eq!(rec.subtype, 13);
        assert_eq!(rec.category_code, Some(10));
        assert_eq!(rec.action_code, Some(7));
        assert_eq!(rec.frequency, Some(5180.0));
    }

    #[test]
    fn skips_lines_missing_timestamp_or_subtype() {
        assert!(parse_line("\t\t\t\t").is_none());
        assert!(parse_line("1.0\twlan\t0\t").is_none());
    }

    #[test]
    fn reduces_combined_type_subtype_modulo_256() {
        let line = "1.0\twlan\t0\t268\t\t\t\t\t\t\t\t\t\t\t";
        let rec = parse_line(line).expect("record");
        assert_eq!(rec.subtype, 12);
    }
}
