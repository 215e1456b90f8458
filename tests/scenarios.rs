//! The six literal input/verdict scenarios from spec.md §8, run through
//! the public driver API exactly as a pipeline client would see them.

use proofgame_engine::pipeline::Driver;
use proofgame_engine::EngineConfig;

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn driver() -> Driver {
    Driver::new(EngineConfig::default())
}

#[test]
fn scenario_1_startpos_to_itself_is_legal_with_empty_proof() {
    let out = driver().run_one(STARTPOS);
    assert!(out.contains("legal:"), "expected legal verdict, got: {out}");
    let proof_idx = out.find("proof:").expect("proof token present");
    let after_proof = &out[proof_idx + "proof:".len()..];
    let moves: Vec<&str> = after_proof.split_whitespace().collect();
    assert!(moves.is_empty(), "expected zero-length proof, got: {moves:?}");
}

#[test]
fn scenario_2_impossible_pawn_count_is_illegal() {
    let goal = "rnbqkbnr/pppppppp/8/8/8/8/1PPPPPPP/RNBQKBNR w KQkq - 0 1";
    let out = driver().run_one(goal);
    assert!(out.contains("illegal:"), "expected illegal verdict, got: {out}");
}

#[test]
fn scenario_3_knight_and_bishop_fianchetto_is_legal_in_four_plies() {
    let goal = "rnbqk1nr/ppppppbp/6p1/8/P7/N7/1PPPPPPP/R1BQKBNR w KQkq - 0 1";
    let out = driver().run_one(goal);
    assert!(out.contains("legal:"), "expected legal verdict, got: {out}");
    let proof = extract_proof(&out);
    assert_eq!(proof.len(), 4, "expected a 4-ply proof, got: {proof:?}");
}

#[test]
fn scenario_4_pure_castling_rights_loss_is_legal_in_sixteen_plies() {
    let goal = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1";
    let out = driver().run_one(goal);
    assert!(out.contains("legal:"), "expected legal verdict, got: {out}");
    let proof = extract_proof(&out);
    assert_eq!(proof.len(), 16, "expected a 16-ply proof, got: {proof:?}");
}

#[test]
fn scenario_5_en_passant_square_is_legal_ending_with_f7f5() {
    let goal = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 1";
    let out = driver().run_one(goal);
    assert!(out.contains("legal:"), "expected legal verdict, got: {out}");
    let proof = extract_proof(&out);
    assert_eq!(proof.len(), 4, "expected a 4-ply proof, got: {proof:?}");
    assert_eq!(proof.last().map(String::as_str), Some("f7f5"));
}

#[test]
fn scenario_6_pawn_captured_own_file_is_illegal() {
    let goal = "rnbqkbnr/p1pppppp/p7/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    let out = driver().run_one(goal);
    assert!(out.contains("illegal:"), "expected illegal verdict, got: {out}");
}

fn extract_proof(line: &str) -> Vec<String> {
    let idx = line.find("proof:").expect("proof token present");
    let rest = &line[idx + "proof:".len()..];
    rest.split_whitespace().map(str::to_string).collect()
}
