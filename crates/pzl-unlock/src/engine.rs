use std::io::{BufRead, Write};

use anyhow::Context;
use pzl_core::EncryptedLink;
use pzl_crypto::{decode_one, Decoded, LinkCipher, PuzzleArtifact};
use secrecy::SecretString;
use tracing::{debug, info};

/// Where the walk through a chain currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockState {
    /// `link` is about to be shown; `depth` counts the links opened so far
    Presenting { link: EncryptedLink, depth: usize },
    /// A wrong answer ended the run
    Failed { answer: String },
    /// The final message was shown
    Done,
}

/// Final result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Solved,
    WrongAnswer,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Solved => 0,
            Outcome::WrongAnswer => 1,
        }
    }
}

/// Walks an encrypted chain, reading one answer per locked link.
///
/// There is no retry: the first wrong answer is final.
pub struct Unlocker<'a, C: LinkCipher + ?Sized> {
    cipher: &'a C,
    state: UnlockState,
}

impl<'a, C: LinkCipher + ?Sized> Unlocker<'a, C> {
    pub fn new(chain: EncryptedLink, cipher: &'a C) -> Self {
        Self {
            cipher,
            state: UnlockState::Presenting {
                link: chain,
                depth: 0,
            },
        }
    }

    pub fn state(&self) -> &UnlockState {
        &self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            UnlockState::Presenting { .. } => None,
            UnlockState::Failed { .. } => Some(Outcome::WrongAnswer),
            UnlockState::Done => Some(Outcome::Solved),
        }
    }

    /// Show the current message and, for a locked link, consume one answer.
    ///
    /// Errors (I/O, malformed artifact) leave the state unchanged.
    pub fn step<R: BufRead + ?Sized, W: Write + ?Sized>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> anyhow::Result<()> {
        let UnlockState::Presenting { link, depth } = &self.state else {
            anyhow::bail!("unlock already finished");
        };
        let depth = *depth;

        writeln!(output, "{}", link.message).context("writing message")?;
        output.flush().context("flushing output")?;

        let Some((locked, tag)) = link.lock()? else {
            info!(depth, "puzzle solved");
            self.state = UnlockState::Done;
            return Ok(());
        };

        let answer = read_answer(input)?;
        let secret = SecretString::from(answer.clone());
        let next = match decode_one(locked, tag, &secret, self.cipher, depth)? {
            Decoded::Next(next) => {
                debug!(depth, "answer accepted");
                UnlockState::Presenting {
                    link: next,
                    depth: depth + 1,
                }
            }
            Decoded::Failure => {
                writeln!(output, "{answer}. Try again!").context("writing failure notice")?;
                output.flush().context("flushing output")?;
                info!(depth, "wrong answer");
                UnlockState::Failed { answer }
            }
        };
        self.state = next;
        Ok(())
    }

    /// Step until the chain is solved or an answer is wrong.
    pub fn run<R: BufRead + ?Sized, W: Write + ?Sized>(
        mut self,
        input: &mut R,
        output: &mut W,
    ) -> anyhow::Result<Outcome> {
        loop {
            if let Some(outcome) = self.outcome() {
                return Ok(outcome);
            }
            self.step(input, output)?;
        }
    }
}

/// Read one answer line without its line terminator.
///
/// End of input is an error: there is no answer to judge.
fn read_answer<R: BufRead + ?Sized>(input: &mut R) -> anyhow::Result<String> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading answer")?;
    if read == 0 {
        anyhow::bail!("input closed before an answer was given");
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}

/// Run a loaded artifact against the given input and output.
pub fn run_puzzle<R: BufRead + ?Sized, W: Write + ?Sized>(
    artifact: &PuzzleArtifact,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<Outcome> {
    Unlocker::new(artifact.chain.clone(), &artifact.crypto).run(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pzl_crypto::{AuthParams, CryptoConfig, HasherKind, HasherSpec, KdfParams, Variant};
    use std::io::Cursor;

    fn crypto() -> CryptoConfig {
        CryptoConfig {
            kdf: KdfParams {
                salt: b"unlock-tests".to_vec(),
                n: 16,
                r: 8,
                p: 1,
                maxmem: KdfParams::default_maxmem(16, 8, 1),
            },
            auth: AuthParams {
                hasher: HasherSpec {
                    name: HasherKind::Sha256,
                    init: Vec::new(),
                },
                digest_length: 32,
            },
            variant: Variant::Plain,
        }
    }

    fn artifact(items: &[&str]) -> PuzzleArtifact {
        PuzzleArtifact::from_list(items, crypto()).unwrap()
    }

    #[test]
    fn test_step_by_step() {
        let artifact = artifact(&["Q1?", "A1", "Done!"]);
        let mut unlocker = Unlocker::new(artifact.chain.clone(), &artifact.crypto);
        let mut input = Cursor::new("A1\n");
        let mut output = Vec::new();

        unlocker.step(&mut input, &mut output).unwrap();
        assert!(matches!(
            unlocker.state(),
            UnlockState::Presenting { depth: 1, link } if link.message == "Done!"
        ));
        assert_eq!(unlocker.outcome(), None);

        unlocker.step(&mut input, &mut output).unwrap();
        assert_eq!(unlocker.state(), &UnlockState::Done);
        assert_eq!(unlocker.outcome(), Some(Outcome::Solved));
        assert_eq!(String::from_utf8(output).unwrap(), "Q1?\nDone!\n");

        assert!(unlocker.step(&mut input, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_terminal_only_reads_nothing() {
        let artifact = artifact(&["Just a message"]);
        let mut input = Cursor::new("unused\n");
        let mut output = Vec::new();

        let outcome = run_puzzle(&artifact, &mut input, &mut output).unwrap();
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(output, b"Just a message\n");
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn test_wrong_answer_state_keeps_answer() {
        let artifact = artifact(&["Q1?", "A1", "Done!"]);
        let mut unlocker = Unlocker::new(artifact.chain.clone(), &artifact.crypto);
        unlocker
            .step(&mut Cursor::new("nope\n"), &mut Vec::new())
            .unwrap();
        assert_eq!(
            unlocker.state(),
            &UnlockState::Failed {
                answer: "nope".into()
            }
        );
        assert_eq!(unlocker.outcome().map(Outcome::exit_code), Some(1));
    }

    #[test]
    fn test_crlf_and_missing_final_newline() {
        let artifact = artifact(&["Q1?", "A1", "Q2?", "A2", "Done!"]);
        let mut output = Vec::new();
        let outcome = run_puzzle(&artifact, &mut Cursor::new("A1\r\nA2"), &mut output).unwrap();
        assert_eq!(outcome, Outcome::Solved);
        assert_eq!(String::from_utf8(output).unwrap(), "Q1?\nQ2?\nDone!\n");
    }

    #[test]
    fn test_eof_is_error_not_wrong_answer() {
        let artifact = artifact(&["Q1?", "A1", "Done!"]);
        let mut output = Vec::new();
        let result = run_puzzle(&artifact, &mut Cursor::new(""), &mut output);
        assert!(result.is_err());
        assert_eq!(String::from_utf8(output).unwrap(), "Q1?\n");
    }

    #[test]
    fn test_malformed_link_is_error() {
        let mut artifact = artifact(&["Q1?", "A1", "Done!"]);
        artifact.chain.tag = None;
        let result = run_puzzle(&artifact, &mut Cursor::new("A1\n"), &mut Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Solved.exit_code(), 0);
        assert_eq!(Outcome::WrongAnswer.exit_code(), 1);
    }
}
