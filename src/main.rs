use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use num::Complex;

use her2kbench::config::{BenchConfig, DEFAULT_ITERATIONS, DEFAULT_SEED};
use her2kbench::device::{DeviceInfo, HostDevice};
use her2kbench::element::Precision;
use her2kbench::kernel::HostHer2k;
use her2kbench::params::{Order, ProblemDescriptor, Transpose, Uplo};
use her2kbench::{cher2k, zher2k, BenchReport, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Function {
    Cher2k,
    Zher2k,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UploArg {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransArg {
    N,
    C,
}

/// Times the accelerated her2k against the host reference.
#[derive(Parser, Debug)]
#[command(name = "her2kbench")]
#[command(version)]
struct Args {
    /// Routine(s) to benchmark
    #[arg(short, long, value_enum, default_value = "all")]
    function: Function,

    /// Order of C (N x N)
    #[arg(short, long, default_value_t = 256)]
    n: usize,

    /// Inner dimension of the rank-2k update
    #[arg(short, long, default_value_t = 64)]
    k: usize,

    #[arg(long, value_enum, default_value = "column")]
    order: OrderArg,

    #[arg(long, value_enum, default_value = "upper")]
    uplo: UploArg,

    /// Operation on A: n (no transpose) or c (conjugate transpose)
    #[arg(long, value_enum, default_value = "n")]
    trans_a: TransArg,

    /// Leading dimensions; each defaults to the packed value
    #[arg(long)]
    lda: Option<usize>,
    #[arg(long)]
    ldb: Option<usize>,
    #[arg(long)]
    ldc: Option<usize>,

    /// Element offsets of A, B and C inside their device buffers
    #[arg(long, default_value_t = 0)]
    off_a: usize,
    #[arg(long, default_value_t = 0)]
    off_b: usize,
    #[arg(long, default_value_t = 0)]
    off_c: usize,

    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    alpha_re: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    alpha_im: f64,
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    beta: f64,

    /// Accelerated launches averaged per measurement
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Refuse row-major problems on the reference path
    #[arg(long)]
    no_row_major: bool,

    /// Global memory reported by the host device, in MiB
    #[arg(long, default_value_t = 4096)]
    global_mem: u64,

    /// Largest single allocation reported by the host device, in MiB
    #[arg(long, default_value_t = 1024)]
    max_alloc: u64,

    /// Report no double-precision support
    #[arg(long)]
    no_double: bool,
}

impl Args {
    fn descriptor(&self) -> ProblemDescriptor {
        let order = match self.order {
            OrderArg::Row => Order::RowMajor,
            OrderArg::Column => Order::ColumnMajor,
        };
        let uplo = match self.uplo {
            UploArg::Upper => Uplo::Upper,
            UploArg::Lower => Uplo::Lower,
        };
        let trans_a = match self.trans_a {
            TransArg::N => Transpose::NoTrans,
            TransArg::C => Transpose::ConjTrans,
        };

        let packed = ProblemDescriptor::new(Precision::Single, order, uplo, trans_a, self.n, self.k);
        packed
            .with_leading_dims(
                self.lda.unwrap_or(packed.lda),
                self.ldb.unwrap_or(packed.ldb),
                self.ldc.unwrap_or(packed.ldc),
            )
            .with_offsets(self.off_a, self.off_b, self.off_c)
            .with_multipliers(Complex::new(self.alpha_re, self.alpha_im), self.beta)
    }

    fn device(&self) -> HostDevice {
        let info = DeviceInfo::new("host")
            .with_global_mem_size(self.global_mem.saturating_mul(1 << 20))
            .with_max_mem_alloc_size(self.max_alloc.saturating_mul(1 << 20))
            .with_double_precision(!self.no_double);
        HostDevice::new(info)
    }

    fn config(&self) -> BenchConfig {
        BenchConfig::default()
            .with_iterations(self.iterations)
            .with_seed(self.seed)
            .with_row_major(!self.no_row_major)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let params = args.descriptor();
    let device = args.device();
    let config = args.config();

    let mut reports: Vec<BenchReport> = Vec::new();
    if matches!(args.function, Function::Cher2k | Function::All) {
        reports.push(cher2k(params, &device, &HostHer2k, &config));
    }
    if matches!(args.function, Function::Zher2k | Function::All) {
        reports.push(zher2k(params, &device, &HostHer2k, &config));
    }

    for report in &reports {
        println!("{report}");
        if let Some(speedup) = report.speedup() {
            println!("  speedup:     {speedup:.2}x");
        }
    }

    if reports.iter().any(|r| r.verdict == Verdict::Fatal) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
