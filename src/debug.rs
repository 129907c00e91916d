use super::chunk::Chunk;

#[cfg(feature = "debug-bytecode")]
pub fn debug_bytecode(chunk: &Chunk, name: &str) {
    eprint!("{}", chunk.disassemble(name));
}

#[cfg(not(feature = "debug-bytecode"))]
pub fn debug_bytecode(_: &Chunk, _: &str) {}

#[cfg(feature = "debug-execution")]
pub fn debug_execution_header() {
    eprintln!("-- trace --");
}

#[cfg(not(feature = "debug-execution"))]
pub fn debug_execution_header() {}
