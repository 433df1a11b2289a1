use std::io::{self, Read, Write};

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Read a single length-prefixed frame from `reader`.
///
/// Wire format:
///   - 4-byte big-endian length (u32)
///   - that many bytes of payload
///
/// Blocks across partial reads until the whole frame arrived. A stream that
/// ends before the frame is complete yields `UnexpectedEof`.
pub fn read_frame<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: Read + ?Sized,
{
    let mut len_buf = [0u8; PREFIX_LEN];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Write a single length-prefixed frame to `writer`.
///
/// Prefix and payload go out as one buffer; short writes are retried until
/// every byte is flushed.
pub fn write_frame<W>(writer: &mut W, payload: &[u8]) -> io::Result<()>
where
    W: Write + ?Sized,
{
    let len: u32 = payload.len().try_into().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "payload of {} bytes does not fit a u32 length prefix",
                payload.len()
            ),
        )
    })?;

    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);

    // write_all loops on short writes, retries EINTR and maps Ok(0) to WriteZero.
    writer.write_all(&frame)?;
    writer.flush()
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
