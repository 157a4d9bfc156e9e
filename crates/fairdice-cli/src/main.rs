//! Fairdice console game
//!
//! Plays one game against the user. A commit-reveal toss decides who picks a
//! die first, then each side rolls its die through a fresh commit-reveal
//! round, so neither roll can be steered after the other party has answered.
//!
//! Usage: `fairdice-cli <faces> <faces> [faces...]` where each `<faces>` is a
//! comma-separated list such as `2,2,4,4,9,9`.

use fairdice_core::{
    Die, DieError, EntropySource, FairRandomRound, ProtocolError, SampleError, SecureSampler,
};
use std::cmp::Ordering;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Application error type
#[derive(Debug, Error)]
enum GameError {
    #[error("Usage: fairdice-cli <faces> <faces> [faces...], each a comma-separated list such as 2,2,4,4,9,9")]
    Usage,

    #[error(transparent)]
    Die(#[from] DieError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Game outcome from the user's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    UserWins,
    ComputerWins,
    Draw,
}

impl Outcome {
    fn decide(user_face: i64, computer_face: i64) -> Self {
        match user_face.cmp(&computer_face) {
            Ordering::Greater => Outcome::UserWins,
            Ordering::Less => Outcome::ComputerWins,
            Ordering::Equal => Outcome::Draw,
        }
    }

    fn banner(self) -> &'static str {
        match self {
            Outcome::UserWins => "You win!",
            Outcome::ComputerWins => "I win!",
            Outcome::Draw => "Draw.",
        }
    }
}

/// Parse one guess line; the error string is shown before reprompting
fn parse_guess(line: &str, range: u64) -> Result<u64, String> {
    let trimmed = line.trim();
    let value: u64 = trimmed
        .parse()
        .map_err(|_| format!("{:?} is not a number", trimmed))?;
    if value >= range {
        return Err(format!("Pick a number between 0 and {}", range - 1));
    }
    Ok(value)
}

/// Prompt until the user supplies a number in `[0, range)`
fn prompt_number(prompt: &str, range: u64) -> Result<u64, GameError> {
    let stdin = io::stdin();
    loop {
        print!("{} [0-{}]: ", prompt, range - 1);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(GameError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed",
            )));
        }
        match parse_guess(&line, range) {
            Ok(value) => return Ok(value),
            Err(reason) => println!("{}", reason),
        }
    }
}

/// Run one commit-reveal round with the user as counterpart
fn fair_round<S: EntropySource>(
    sampler: &mut SecureSampler<S>,
    range: u64,
) -> Result<u64, GameError> {
    let mut round = FairRandomRound::new(range, sampler)?;
    info!(round_id = %round.id(), range, "round committed");

    println!(
        "I picked a number in [0,{}) and committed to it (HMAC: {}).",
        range,
        round.commitment()
    );
    let guess = prompt_number("Add your number", range)?;

    let result = round.finalize(guess)?;
    println!(
        "My number was {} (key: {}); ({} + {}) % {} = {}.",
        round.committed_value()?,
        round.reveal_key()?.to_hex(),
        round.committed_value()?,
        guess,
        range,
        result
    );
    info!(round_id = %round.id(), result, "round revealed");
    Ok(result)
}

/// Roll a die through a fair round; the modular result indexes the face
fn fair_roll<S: EntropySource>(
    sampler: &mut SecureSampler<S>,
    die: &Die,
) -> Result<i64, GameError> {
    let index = fair_round(sampler, die.face_count())?;
    Ok(die.faces()[index as usize])
}

/// Let the user pick one die from the list
fn prompt_die_choice(dice: &[Die]) -> Result<usize, GameError> {
    for (index, die) in dice.iter().enumerate() {
        println!("  {}: {}", index, die);
    }
    let choice = prompt_number("Choose your die", dice.len() as u64)?;
    Ok(choice as usize)
}

fn run() -> Result<(), GameError> {
    let dice: Vec<Die> = std::env::args()
        .skip(1)
        .map(|arg| arg.parse())
        .collect::<Result<_, _>>()?;
    if dice.len() < 2 {
        return Err(GameError::Usage);
    }

    let mut sampler = SecureSampler::new();

    println!("Let's decide who picks a die first.");
    let toss = fair_round(&mut sampler, 2)?;
    let user_first = toss == 0;
    println!("{} pick first.", if user_first { "You" } else { "I" });

    let (user_die, computer_die) = if user_first {
        let choice = prompt_die_choice(&dice)?;
        let user_die = dice[choice].clone();
        let mut rest = dice;
        rest.remove(choice);

        let pick = sampler.sample(rest.len() as u64)? as usize;
        let computer_die = rest.swap_remove(pick);
        println!("I take {}.", computer_die);
        (user_die, computer_die)
    } else {
        let pick = sampler.sample(dice.len() as u64)? as usize;
        let mut rest = dice;
        let computer_die = rest.remove(pick);
        println!("I take {}.", computer_die);

        let choice = prompt_die_choice(&rest)?;
        (rest[choice].clone(), computer_die)
    };

    println!("My roll of {}:", computer_die);
    let computer_face = fair_roll(&mut sampler, &computer_die)?;
    println!("I rolled {}.", computer_face);

    println!("Your roll of {}:", user_die);
    let user_face = fair_roll(&mut sampler, &user_die)?;
    println!("You rolled {}.", user_face);

    let outcome = Outcome::decide(user_face, computer_face);
    println!("{} ({} vs {})", outcome.banner(), user_face, computer_face);
    Ok(())
}

fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
