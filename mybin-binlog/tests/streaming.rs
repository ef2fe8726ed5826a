use bytes::{Bytes, BytesMut};
use bytes_parser::{WriteBytesExt, WriteToBytes, WriteToBytesWithContext};
use mybin_binlog::{
    CompressionType, EventHeader, LogEventType, PayloadEvents, PayloadHeader, QueryData, RawEvent,
    Result,
};
use std::alloc::{GlobalAlloc, Layout, System};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// tracks live bytes allocated by rust code
struct CountingAlloc;

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        CURRENT.fetch_sub(layout.size(), Ordering::SeqCst);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            if new_size > layout.size() {
                grow(new_size - layout.size());
            } else {
                CURRENT.fetch_sub(layout.size() - new_size, Ordering::SeqCst);
            }
        }
        new_ptr
    }
}

fn grow(size: usize) {
    let now = CURRENT.fetch_add(size, Ordering::SeqCst) + size;
    PEAK.fetch_max(now, Ordering::SeqCst);
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc;

const UNCOMPRESSED_TARGET: usize = 32 * 1024 * 1024;
const MAX_EXTRA_MEMORY: usize = 16 * 1024 * 1024;

/// compress query events of at least given total size,
/// the plain stream never resides in memory as a whole
fn compressed_transaction(target: usize) -> Result<(Vec<u8>, usize, usize)> {
    let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), 3)?;
    let mut buf = BytesMut::new();
    let mut plain_len = 0;
    let mut n_events = 0;
    while plain_len < target {
        let query = format!(
            "insert into t1 values ({}, '{}')",
            n_events,
            "payload".repeat(128)
        );
        RawEvent::new(
            EventHeader::new(LogEventType::QueryEvent, n_events as u32, 1),
            QueryData::new("db1", query),
        )
        .write_with_ctx(&mut buf, false)?;
        encoder.write_all(&buf)?;
        plain_len += buf.len();
        n_events += 1;
        buf.clear();
    }
    let compressed = encoder.finish()?;
    Ok((compressed, plain_len, n_events))
}

#[test]
fn test_stream_large_transaction_in_bounded_memory() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let (compressed, plain_len, n_events) = compressed_transaction(UNCOMPRESSED_TARGET)?;
    assert!(plain_len >= UNCOMPRESSED_TARGET);

    let mut body = BytesMut::new();
    PayloadHeader {
        payload_size: compressed.len() as u32,
        compression_type: 1,
        uncompressed_size: plain_len as u64,
    }
    .write_to(&mut body)?;
    body.write_bytes(&compressed)?;
    drop(compressed);
    let mut input: Bytes = body.freeze();

    let baseline = CURRENT.load(Ordering::SeqCst);
    PEAK.store(baseline, Ordering::SeqCst);

    let header = PayloadHeader::read_from(&mut input)?;
    assert_eq!(plain_len as u64, header.uncompressed_size);
    let payload = input.split_to(header.payload_size as usize);
    let mut count = 0;
    let mut last_query = Bytes::new();
    for event in PayloadEvents::new(header.compression(), payload)? {
        let event = event?;
        assert_eq!(LogEventType::QueryEvent, event.event_type());
        if let mybin_binlog::Event::QueryEvent(qe) = event {
            last_query = qe.data.query;
        }
        count += 1;
    }
    assert_eq!(n_events, count);
    assert!(last_query.starts_with(format!("insert into t1 values ({},", n_events - 1).as_bytes()));
    assert_eq!(CompressionType::Zstd, header.compression());

    let extra = PEAK.load(Ordering::SeqCst) - baseline;
    assert!(
        extra < MAX_EXTRA_MEMORY,
        "peak memory grew by {} bytes while streaming {} bytes",
        extra,
        plain_len
    );
    Ok(())
}
