use std::io::Write;
use clap::{Parser, ValueEnum};
use rand_stdfix::*;

// Writes raw engine output to stdout, for piping into statistical test suites
// such as PractRand: `rand_stdfix philox4x64 | RNG_test stdin64`.
// Engines with words narrower than 64 bits are concatenated, lowest bits first.

#[derive(Debug, Parser)]
#[command(name = "rand_stdfix", about = "Stream raw engine output to stdout")]
struct Args {
    /// Engine to stream.
    #[arg(value_enum)]
    engine: Engine,

    /// Use the literal transition function instead of the corrected one.
    #[arg(long)]
    literal: bool,

    /// Integer seed; defaults to the engine's default seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Engine {
    #[value(name = "ranlux24")]
    Ranlux24,
    #[value(name = "ranlux48")]
    Ranlux48,
    #[value(name = "philox2x32")]
    Philox2x32,
    #[value(name = "philox4x32")]
    Philox4x32,
    #[value(name = "philox2x64")]
    Philox2x64,
    #[value(name = "philox4x64")]
    Philox4x64,
}

fn stream<R: RngCore>(mut rng: R) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    let mut v: Vec<u8> = Vec::new();

    loop {
        v.extend_from_slice(&rng.next_u64().to_le_bytes());

        if v.len() >= 0x10000 {
            stdout.write_all(v.as_slice())?;
            v.clear();
        }
    }
}

/// Philox engine that always steps with the given round function.
struct Stepped<const W: u32, const N: usize, const R: usize>(Philox<W, N, R>, Variant);

impl<const W: u32, const N: usize, const R: usize> RngCore for Stepped<W, N, R> {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64_with(self.1)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let variant = if args.literal { Variant::Literal } else { Variant::Corrected };

    match args.engine {
        Engine::Ranlux24 => stream(Ranlux24Base::new(args.seed.unwrap_or(0), variant)),
        Engine::Ranlux48 => stream(Ranlux48Base::new(args.seed.unwrap_or(0), variant)),
        Engine::Philox2x32 => stream(Stepped(Philox2x32::new(args.seed.unwrap_or(Philox2x32::DEFAULT_SEED)), variant)),
        Engine::Philox4x32 => stream(Stepped(Philox4x32::new(args.seed.unwrap_or(Philox4x32::DEFAULT_SEED)), variant)),
        Engine::Philox2x64 => stream(Stepped(Philox2x64::new(args.seed.unwrap_or(Philox2x64::DEFAULT_SEED)), variant)),
        Engine::Philox4x64 => stream(Stepped(Philox4x64::new(args.seed.unwrap_or(Philox4x64::DEFAULT_SEED)), variant)),
    }
}
