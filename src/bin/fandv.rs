//! fandv: command-line driver over persisted keys and ciphertexts.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::{bail, Context, Result};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use fandv::collections::{CiphertextMatrix, CiphertextVector};
use fandv::fv::{keygen_with_rng, Ciphertext};
use fandv::params::presets;
use fandv::persist;
use fandv::sampling::Sampler;

#[derive(Parser)]
#[command(name = "fandv")]
#[command(about = "Fan-Vercauteren homomorphic encryption on integers")]
#[command(version)]
struct Args {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key bundle
    Keygen {
        /// Parameter preset: standard, compact or toy
        #[arg(long, default_value = "standard")]
        preset: String,
        /// Seed for reproducible keys
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Encrypt one value, a vector, or a column-major matrix
    Encrypt {
        #[arg(long)]
        keys: PathBuf,
        #[arg(long, short)]
        out: PathBuf,
        /// Store as a matrix with this many rows
        #[arg(long, requires = "ncol")]
        nrow: Option<usize>,
        #[arg(long, requires = "nrow")]
        ncol: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<i64>,
    },
    /// Decrypt a ciphertext, vector or matrix file
    Decrypt {
        #[arg(long)]
        keys: PathBuf,
        input: PathBuf,
    },
    /// Homomorphic sum of two objects of the same kind
    Add {
        lhs: PathBuf,
        rhs: PathBuf,
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Homomorphic product; matrices are multiplied with --matmul
    Mul {
        lhs: PathBuf,
        rhs: PathBuf,
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long)]
        matmul: bool,
    },
    /// Print a summary of any saved object
    Show { input: PathBuf },
}

/// A loaded ciphertext container.
enum Object {
    Single(Ciphertext),
    Vector(CiphertextVector),
    Matrix(CiphertextMatrix),
}

impl Object {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let tag = text.lines().nth(1).unwrap_or_default().trim().to_owned();
        debug!(%tag, path = %path.display(), "loading object");
        let reader = Cursor::new(text);
        let object = match tag.as_str() {
            persist::TAG_CIPHERTEXT => Object::Single(persist::load_ciphertext(reader)?),
            persist::TAG_VECTOR => Object::Vector(persist::load_vector(reader)?),
            persist::TAG_MATRIX => Object::Matrix(persist::load_matrix(reader)?),
            other => bail!("{} does not hold ciphertexts (tag `{other}`)", path.display()),
        };
        Ok(object)
    }

    fn save(&self, path: &Path) -> Result<()> {
        match self {
            Object::Single(ct) => persist::save_ciphertext_file(path, ct)?,
            Object::Vector(v) => persist::save_vector_file(path, v)?,
            Object::Matrix(m) => persist::save_matrix_file(path, m)?,
        }
        info!("Wrote {}", path.display());
        Ok(())
    }
}

fn sampler(seed: Option<u64>) -> Sampler<rand_chacha::ChaCha20Rng> {
    seed.map_or_else(Sampler::from_os_rng, Sampler::from_seed)
}

fn combine(lhs: Object, rhs: Object, mul: bool, matmul: bool) -> Result<Object> {
    let out = match (lhs, rhs) {
        (Object::Single(a), Object::Single(b)) if mul => Object::Single(a.mul(&b)?),
        (Object::Single(a), Object::Single(b)) => Object::Single(a.add(&b)?),
        (Object::Vector(a), Object::Vector(b)) if mul => Object::Vector(a.mul(&b)?),
        (Object::Vector(a), Object::Vector(b)) => Object::Vector(a.add(&b)?),
        (Object::Vector(v), Object::Single(c)) | (Object::Single(c), Object::Vector(v)) => {
            Object::Vector(if mul { v.mul_ct(&c)? } else { v.add_ct(&c)? })
        }
        (Object::Matrix(a), Object::Matrix(b)) if matmul => Object::Matrix(a.matmul_parallel(&b)?),
        (Object::Matrix(a), Object::Matrix(b)) if mul => Object::Matrix(a.mul(&b)?),
        (Object::Matrix(a), Object::Matrix(b)) => Object::Matrix(a.add(&b)?),
        (Object::Matrix(m), Object::Single(c)) | (Object::Single(c), Object::Matrix(m)) => {
            Object::Matrix(if mul { m.mul_ct(&c)? } else { m.add_ct(&c)? })
        }
        _ => bail!("operands must be of compatible kinds"),
    };
    Ok(out)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Keygen { preset, seed, out } => {
            let params = presets::by_name(&preset)
                .ok_or_else(|| eyre::eyre!("Unknown preset: {preset}. Use standard, compact or toy"))??;
            info!("Generating keys (d = {}, q = 2^{})", params.ring_degree, params.qpow);
            let (sk, pk, rlk) = keygen_with_rng(&params, &mut sampler(seed));
            persist::save_keys_file(&out, &sk, &pk, &rlk)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!("Wrote {}", out.display());
        }
        Command::Encrypt { keys, out, nrow, ncol, seed, values } => {
            let (_, pk, _) = persist::load_keys_file(&keys)
                .with_context(|| format!("Failed to load keys from {}", keys.display()))?;
            let mut rng = sampler(seed);
            let object = match (nrow, ncol, values.as_slice()) {
                (Some(r), Some(c), _) => Object::Matrix(pk.encrypt_matrix_with_rng(&values, r, c, &mut rng)?),
                (_, _, [m]) => Object::Single(pk.encrypt_with_rng(*m, &mut rng)?),
                _ => Object::Vector(pk.encrypt_vector_with_rng(&values, &mut rng)?),
            };
            object.save(&out)?;
        }
        Command::Decrypt { keys, input } => {
            let (sk, _, _) = persist::load_keys_file(&keys)
                .with_context(|| format!("Failed to load keys from {}", keys.display()))?;
            match Object::load(&input)? {
                Object::Single(ct) => println!("{}", sk.decrypt(&ct)?),
                Object::Vector(v) => {
                    let values: Vec<String> = sk.decrypt_vector(&v)?.iter().map(ToString::to_string).collect();
                    println!("{}", values.join(" "));
                }
                Object::Matrix(m) => {
                    let values = sk.decrypt_matrix(&m)?;
                    for i in 0..m.nrow() {
                        let row: Vec<String> = (0..m.ncol())
                            .map(|j| values[i + j * m.nrow()].to_string())
                            .collect();
                        println!("{}", row.join(" "));
                    }
                }
            }
        }
        Command::Add { lhs, rhs, out } => {
            combine(Object::load(&lhs)?, Object::load(&rhs)?, false, false)?.save(&out)?;
        }
        Command::Mul { lhs, rhs, out, matmul } => {
            combine(Object::load(&lhs)?, Object::load(&rhs)?, true, matmul)?.save(&out)?;
        }
        Command::Show { input } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let tag = text.lines().nth(1).unwrap_or_default().trim();
            let reader = Cursor::new(text.as_str());
            match tag {
                persist::TAG_PARAMS => println!("{}", persist::load_params(reader)?),
                persist::TAG_PUBLIC_KEY => println!("{}", persist::load_public_key(reader)?),
                persist::TAG_RELIN_KEY => println!("{}", persist::load_relin_key(reader)?),
                persist::TAG_KEYS => {
                    let (_, pk, _) = persist::load_keys(reader)?;
                    println!("Key bundle (secret key not shown)\n{pk}\n{}", pk.params());
                }
                _ => match Object::load(&input)? {
                    Object::Single(ct) => println!("{ct}"),
                    Object::Vector(v) => println!("{v}"),
                    Object::Matrix(m) => println!("{m}"),
                },
            }
        }
    }

    Ok(())
}
