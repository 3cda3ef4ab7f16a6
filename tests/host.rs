use cvxif_complex::alu::{apply, ArithmeticUnit};
use cvxif_complex::host::{Completion, Host, HostConfig, HostError, HostPhase};
use cvxif_complex::{
    Complex16, ComplexAlu, Coprocessor, CoprocessorConfig, CvxifDecoder, Decoded, Decoder,
    Instruction, OperandMask, Operation, Rejected, State,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn host() -> Host<CvxifDecoder, ComplexAlu> {
    let dec = CoprocessorConfig::default().decoder();
    let mut h = Host::new(Coprocessor::new(), dec, ComplexAlu, HostConfig::default());
    h.reset();
    h
}

fn instr(op: Operation) -> u32 {
    Instruction::new(op, 14, 14, 12).0
}

#[test]
fn rejected_instruction_skips_later_phases() {
    let mut h = host();
    let before = h.cop.cycle();
    let outcome = h.execute(0xDEAD_BEEF, &[Complex16::new(1, -2)], || true).unwrap();
    assert_eq!(outcome, Completion::Rejected);
    assert_eq!(h.cop.cycle() - before, 1);
    assert_eq!(h.cop.state(), State::Idle);
}

#[test]
fn harness_add_sequence() {
    let mut h = host();
    let a = Complex16::new(1, -2);
    let b = Complex16::new(3, 4);
    assert_eq!(h.execute(0xDEAD_BEEF, &[a, b], || true).unwrap(), Completion::Rejected);
    let outcome = h.execute(instr(Operation::Add), &[a, b], || true).unwrap();
    // issue, register, compute, deliver
    assert_eq!(
        outcome,
        Completion::Completed {
            result: Complex16::new(4, 2),
            cycles: 4
        }
    );
}

#[test]
fn thousand_random_adds_under_backpressure() {
    let mut h = host();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut ready_rng = StdRng::seed_from_u64(7);
    let b = Complex16::new(3, 4);
    for _ in 0..1000 {
        let a = Complex16::new(rng.gen(), rng.gen());
        let outcome = h
            .execute(instr(Operation::Add), &[a, b], || ready_rng.gen_bool(0.5))
            .unwrap();
        assert_eq!(outcome.result(), Some(apply(Operation::Add, a, Some(b))));
    }
}

#[test]
fn thousand_random_conjugates_under_backpressure() {
    let mut h = host();
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let mut ready_rng = StdRng::seed_from_u64(11);
    for _ in 0..1000 {
        let a = Complex16::new(rng.gen(), rng.gen());
        let outcome = h
            .execute(instr(Operation::Conjugate), &[a], || ready_rng.gen_bool(0.5))
            .unwrap();
        assert_eq!(outcome.result(), Some(Complex16::new(a.re, a.im.wrapping_neg())));
    }
}

#[test]
fn never_ready_stalls_in_result_phase() {
    let cfg = HostConfig {
        max_phase_cycles: 16,
        ..HostConfig::default()
    };
    let mut h = Host::new(Coprocessor::default(), CvxifDecoder::new(), ComplexAlu, cfg);
    let err = h
        .execute(instr(Operation::Conjugate), &[Complex16::new(1, 1)], || false)
        .unwrap_err();
    assert_eq!(
        err,
        HostError::Stalled {
            phase: HostPhase::Result,
            cycles: 16
        }
    );
    // The result is still held; a late ready delivers it unchanged.
    assert_eq!(h.cop.held_result(), Some(Complex16::new(1, -1)));
}

#[test]
fn too_few_operands_is_a_host_error() {
    let mut h = host();
    let err = h
        .execute(instr(Operation::Add), &[Complex16::new(1, 1)], || true)
        .unwrap_err();
    assert_eq!(err, HostError::MissingOperands { needed: 2, given: 1 });
}

// Accepts what the real decoder accepts but only ever asks for rs1.
struct NarrowMask(CvxifDecoder);

impl Decoder for NarrowMask {
    fn decode(&self, word: u32) -> Result<Decoded, Rejected> {
        let mut d = self.0.decode(word)?;
        d.mask = OperandMask::RS1;
        Ok(d)
    }
}

#[test]
fn narrowed_register_mask_is_a_bad_issue_response() {
    let mut h = Host::new(
        Coprocessor::new(),
        NarrowMask(CvxifDecoder::new()),
        ComplexAlu,
        HostConfig::default(),
    );
    h.reset();
    let add = instr(Operation::Add);
    let err = h
        .execute(add, &[Complex16::new(1, -2), Complex16::new(3, 4)], || true)
        .unwrap_err();
    assert_eq!(
        err,
        HostError::BadIssueResponse {
            instr: add,
            writeback: true,
            mask: 0b01,
            expected: 0b11
        }
    );
    // Nothing was fed; the coprocessor is still waiting for operands.
    assert_eq!(h.cop.state(), State::AwaitOperands);
}

// Unit whose output drifts every evaluation; the coprocessor must latch it once.
struct Drifting(std::cell::Cell<i16>);

impl ArithmeticUnit for Drifting {
    fn apply(&self, _op: Operation, a: Complex16, _b: Option<Complex16>) -> Complex16 {
        let n = self.0.get();
        self.0.set(n.wrapping_add(1));
        Complex16::new(a.re.wrapping_add(n), a.im)
    }
}

#[test]
fn result_is_latched_once_per_transaction() {
    let mut h = Host::new(
        Coprocessor::default(),
        CvxifDecoder::new(),
        Drifting(std::cell::Cell::new(0)),
        HostConfig::default(),
    );
    let mut toggles = [false, false, false, false, false, true].into_iter();
    let outcome = h
        .execute(instr(Operation::Conjugate), &[Complex16::new(10, 3)], || {
            toggles.next().unwrap_or(true)
        })
        .unwrap();
    assert_eq!(outcome.result(), Some(Complex16::new(10, 3)));
}

#[test]
fn trace_records_last_transaction_only() {
    let mut h = host().with_trace(true);
    h.execute(instr(Operation::Add), &[Complex16::new(1, 1), Complex16::new(1, 1)], || true)
        .unwrap();
    h.execute(0xDEAD_BEEF, &[], || true).unwrap();
    let trace = h.trace();
    assert_eq!(trace.len(), 1);
    assert_eq!(trace[0].state, State::Idle);
    assert!(trace[0].inputs.issue_valid);
    assert!(!trace[0].outputs.issue_accept);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_ready_pattern_with_a_true_completes(
        pattern in proptest::collection::vec(any::<bool>(), 0..40),
        re in any::<i16>(),
        im in any::<i16>(),
    ) {
        let mut h = host();
        let mut it = pattern.into_iter().chain(std::iter::once(true)).cycle();
        let a = Complex16::new(re, im);
        let outcome = h.execute(instr(Operation::Conjugate), &[a], || it.next().unwrap_or(true));
        prop_assert_eq!(outcome.map(|c| c.result()), Ok(Some(a.conj())));
    }
}
