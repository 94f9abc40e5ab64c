// Wire protocol: record codec, cipher, region table, transport, and the probe/dispatch layers built on them.

pub mod cipher;
pub mod codec;
pub mod core;
pub mod dispatcher;
pub mod probe;
pub mod regions;
