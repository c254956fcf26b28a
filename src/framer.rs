//! Length-prefixed record I/O.
//!
//! Each record goes on the wire as `<decimal length> SP <payload>`, where the
//! payload is the output of [`RecordLayer::protect`]. Change cipher spec
//! records are consumed here and never reach the caller.

use std::io::{self, Read, Write};

use crate::message::{ContentType, CHANGE_CIPHER_SPEC};
use crate::record::RecordLayer;
use crate::{Config, Error};

pub(crate) struct Framer<S> {
    stream: S,
    records: RecordLayer,
    max_record_len: usize,
    max_corrupted_records: Option<usize>,
}

impl<S: Read + Write> Framer<S> {
    pub fn new(stream: S, config: &Config) -> Self {
        Framer {
            stream,
            records: RecordLayer::new(config.crypto_provider().clone()),
            max_record_len: config.max_record_len(),
            max_corrupted_records: config.max_corrupted_records(),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn records(&self) -> &RecordLayer {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut RecordLayer {
        &mut self.records
    }

    /// Protect and write one record in a single write.
    pub fn send(&mut self, content_type: ContentType, body: &[u8]) -> Result<(), Error> {
        let mut plaintext = Vec::with_capacity(1 + body.len());
        plaintext.push(content_type.as_u8());
        plaintext.extend_from_slice(body);

        let payload = self.records.protect(&plaintext)?;

        let prefix = format!("{} ", payload.len());
        let mut frame = Vec::with_capacity(prefix.len() + payload.len());
        frame.extend_from_slice(prefix.as_bytes());
        frame.extend_from_slice(&payload);

        self.stream.write_all(&frame)?;
        self.stream.flush()?;

        Ok(())
    }

    /// Send a change cipher spec under the current write spec, then promote
    /// the pending one.
    pub fn send_change_cipher_spec(&mut self) -> Result<(), Error> {
        self.send(ContentType::ChangeCipherSpec, CHANGE_CIPHER_SPEC)?;
        self.records.change_write_spec();
        Ok(())
    }

    /// Next handshake or application data record.
    ///
    /// Records failing protection checks are dropped. Change cipher spec
    /// records promote the pending read spec.
    pub fn recv(&mut self) -> Result<(ContentType, Vec<u8>), Error> {
        let mut corrupted = 0;

        loop {
            let frame = self.read_frame()?;

            let Some(plaintext) = self.records.unprotect(&frame) else {
                corrupted += 1;
                debug!("Dropping corrupted record ({} in a row)", corrupted);

                if let Some(max) = self.max_corrupted_records {
                    if corrupted > max {
                        return Err(Error::TooManyCorruptedRecords(corrupted));
                    }
                }
                continue;
            };
            corrupted = 0;

            let (body, content_type) = ContentType::parse(&plaintext)
                .map_err(|_| Error::Decode("Empty record".to_string()))?;

            match content_type {
                ContentType::ChangeCipherSpec => {
                    if body != CHANGE_CIPHER_SPEC {
                        return Err(Error::Decode("Malformed change cipher spec".to_string()));
                    }
                    self.records.change_read_spec();
                }
                ContentType::Handshake | ContentType::ApplicationData => {
                    return Ok((content_type, body.to_vec()));
                }
                ContentType::Unknown(v) => {
                    return Err(Error::Decode(format!("Unknown content type: {}", v)));
                }
            }
        }
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, Error> {
        let mut len: usize = 0;
        let mut digits = 0;

        loop {
            let mut byte = [0u8; 1];
            self.stream.read_exact(&mut byte).map_err(read_error)?;

            match byte[0] {
                b' ' if digits > 0 => break,
                b @ b'0'..=b'9' => {
                    digits += 1;
                    len = len
                        .checked_mul(10)
                        .and_then(|l| l.checked_add((b - b'0') as usize))
                        .filter(|l| *l <= self.max_record_len)
                        .ok_or_else(|| {
                            Error::BadFrame(format!(
                                "Record longer than {} bytes",
                                self.max_record_len
                            ))
                        })?;
                }
                b => {
                    return Err(Error::BadFrame(format!(
                        "Unexpected byte in length prefix: 0x{:02x}",
                        b
                    )));
                }
            }
        }

        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).map_err(read_error)?;

        Ok(payload)
    }
}

fn read_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => Error::Disconnected,
        _ => Error::Io(e),
    }
}
