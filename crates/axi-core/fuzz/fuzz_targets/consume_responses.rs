#![no_main]

use std::time::Duration;

use axi_core::{Command, Handler, ResponseCode, S2m, SimHandler};
use libfuzzer_sys::fuzz_target;

fn cycle(bytes: &[u8]) -> S2m {
    let flags = bytes[0];
    S2m {
        bvalid: flags & 0x01 != 0,
        rvalid: flags & 0x02 != 0,
        bresp: ResponseCode::from_bits((flags >> 2) & 0x3).unwrap_or_default(),
        rresp: ResponseCode::from_bits((flags >> 4) & 0x3).unwrap_or_default(),
        rdata: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
        ..S2m::IDLE
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let burst = usize::from(data[0] % 8) + 1;
    let responses: Vec<S2m> = data[1..].chunks_exact(5).map(cycle).collect();

    let mut handler = SimHandler::new();
    let commands = [
        Command::set_unsigneds(&[1, 2, 3], 0, false),
        Command::fake_wait(usize::from(data[0] >> 4), Duration::ZERO),
        Command::get_boolean(4),
        Command::get_unsigneds(8, burst, data[0] & 0x80 != 0),
    ];
    let queued: Vec<Command> = commands.into_iter().flatten().collect();
    let handles: Vec<_> = queued.iter().map(Command::result).collect();
    if handler.send(queued).is_err() {
        return;
    }
    handler.render();

    let consumed = handler.consume(&responses);
    assert!(handles.iter().all(|handle| handle.is_ready()));
    assert!(handler.is_idle());
    if consumed.is_err() {
        assert!(handles.iter().any(|handle| handle.fault().is_some()));
    }
});
