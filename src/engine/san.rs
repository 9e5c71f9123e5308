//! Standard Algebraic Notation (SAN) resolution.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`.
//!
//! A SAN string only describes a move; the concrete origin square is found by
//! enumerating the legal moves of the side to move and keeping the ones whose
//! piece kind, destination, promotion, and disambiguators all match. Exactly
//! one survivor is the answer; zero or several are errors.

use crate::engine::board::Board;
use crate::engine::movegen;
use crate::engine::types::{ChessError, Move, MoveKind, PieceKind, Square};

/// Resolve a SAN string against the current position.
///
/// Accepts standard SAN (`e4`, `Nf3`, `Bxe5`, `O-O`, `O-O-O`, `e8=Q`, …) with
/// optional `+`/`#` check markers and `!`/`?` annotations, plus the `0-0`
/// castle spelling. The board is only borrowed mutably for move generation;
/// the resolved move is *not* applied.
pub fn find_move(board: &mut Board, san: &str) -> Result<Move, ChessError> {
    let side = board.side_to_move();
    let (legal, _) = movegen::legal_moves(board, side);
    let stripped = san.trim_end_matches(['+', '#', '!', '?']);

    // Castling literals.
    if stripped == "O-O" || stripped == "0-0" {
        return find_castle(&legal, san, 6);
    }
    if stripped == "O-O-O" || stripped == "0-0-0" {
        return find_castle(&legal, san, 2);
    }

    let chars: Vec<char> = stripped.chars().collect();
    if chars.is_empty() {
        return Err(ChessError::IllegalMove {
            san: san.to_string(),
            reason: "empty move text".into(),
        });
    }

    // Promotion suffix.
    let (chars, promotion) = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        let promo = match chars[chars.len() - 1] {
            'Q' | 'q' => PieceKind::Queen,
            'R' | 'r' => PieceKind::Rook,
            'B' | 'b' => PieceKind::Bishop,
            'N' | 'n' => PieceKind::Knight,
            other => {
                return Err(ChessError::IllegalMove {
                    san: san.to_string(),
                    reason: format!("invalid promotion piece '{other}'"),
                });
            }
        };
        (&chars[..chars.len() - 2], Some(promo))
    } else {
        (&chars[..], None)
    };

    // Leading piece letter (default: pawn).
    let (piece, rest) = match chars.first() {
        Some('N') => (PieceKind::Knight, &chars[1..]),
        Some('B') => (PieceKind::Bishop, &chars[1..]),
        Some('R') => (PieceKind::Rook, &chars[1..]),
        Some('Q') => (PieceKind::Queen, &chars[1..]),
        Some('K') => (PieceKind::King, &chars[1..]),
        _ => (PieceKind::Pawn, chars),
    };

    // The capture marker carries no information the board lacks.
    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();

    if rest.len() < 2 {
        return Err(ChessError::IllegalMove {
            san: san.to_string(),
            reason: "move text too short".into(),
        });
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest = Square::from_algebraic(&dest_str)
        .ok_or_else(|| ChessError::InvalidSquare(dest_str.clone()))?;

    // Disambiguation characters (0, 1, or 2) before the destination.
    let disambig = &rest[..rest.len() - 2];
    let disambig_file: Option<u8> = disambig
        .iter()
        .find(|c| c.is_ascii_lowercase())
        .map(|&c| c as u8 - b'a');
    let disambig_rank: Option<u8> = disambig
        .iter()
        .find(|c| c.is_ascii_digit())
        .map(|&c| c as u8 - b'1');

    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == dest
                && m.kind != MoveKind::Castle
                && m.piece.kind() == piece
                && m.kind.promotion() == promotion
                && disambig_file.is_none_or(|f| m.from.file() == f)
                && disambig_rank.is_none_or(|r| m.from.rank() == r)
        })
        .collect();

    match candidates.len() {
        0 => Err(ChessError::IllegalMove {
            san: san.to_string(),
            reason: "no matching legal move".into(),
        }),
        1 => Ok(*candidates[0]),
        n => Err(ChessError::AmbiguousMove {
            san: san.to_string(),
            candidates: n,
        }),
    }
}

fn find_castle(legal: &[Move], san: &str, king_file: u8) -> Result<Move, ChessError> {
    legal
        .iter()
        .find(|m| m.kind == MoveKind::Castle && m.to.file() == king_file)
        .copied()
        .ok_or_else(|| ChessError::IllegalMove {
            san: san.to_string(),
            reason: "castling not legal here".into(),
        })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::MoveFlags;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn resolve(fen: &str, san: &str) -> Move {
        find_move(&mut board(fen), san).unwrap()
    }

    const START: &str = crate::engine::board::STARTING_FEN;

    // -------------------------------------------------------------------
    // Pawn moves
    // -------------------------------------------------------------------

    #[test]
    fn pawn_push() {
        let mv = resolve(START, "e4");
        assert_eq!(mv.from, sq("e2"));
        assert_eq!(mv.to, sq("e4"));
        assert_eq!(mv.kind, MoveKind::Normal);
    }

    #[test]
    fn pawn_capture_with_file() {
        let mv = resolve(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
            "exd5",
        );
        assert_eq!(mv.from, sq("e4"));
        assert_eq!(mv.to, sq("d5"));
        assert!(mv.flags.is_capture());
    }

    #[test]
    fn pawn_promotion() {
        let mv = resolve("7k/4P3/8/8/8/8/8/4K3 w - - 0 1", "e8=Q");
        assert_eq!(mv.kind, MoveKind::PromoteQueen);
        assert_eq!(mv.to, sq("e8"));
    }

    #[test]
    fn pawn_underpromotion() {
        let mv = resolve("7k/4P3/8/8/8/8/8/4K3 w - - 0 1", "e8=N");
        assert_eq!(mv.kind, MoveKind::PromoteKnight);
    }

    #[test]
    fn promotion_without_suffix_does_not_match() {
        // A bare "e8" names no promotion piece, so nothing matches.
        assert!(find_move(&mut board("7k/4P3/8/8/8/8/8/4K3 w - - 0 1"), "e8").is_err());
    }

    #[test]
    fn en_passant_resolves() {
        let mv = resolve(
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "exf6",
        );
        assert_eq!(mv.kind, MoveKind::EnPassant);
        assert!(mv.flags.is_capture());
    }

    // -------------------------------------------------------------------
    // Piece moves & disambiguation
    // -------------------------------------------------------------------

    #[test]
    fn knight_move() {
        let mv = resolve(START, "Nf3");
        assert_eq!(mv.from, sq("g1"));
        assert_eq!(mv.to, sq("f3"));
        assert_eq!(mv.piece.kind(), PieceKind::Knight);
    }

    #[test]
    fn file_disambiguation() {
        // Rooks on a1 and h1 both reach d1.
        let mv = resolve("4k3/8/8/8/8/4K3/8/R6R w - - 0 1", "Rad1");
        assert_eq!(mv.from, sq("a1"));
        let mv = resolve("4k3/8/8/8/8/4K3/8/R6R w - - 0 1", "Rhd1");
        assert_eq!(mv.from, sq("h1"));
    }

    #[test]
    fn rank_disambiguation() {
        // Rooks on a1 and a8 both reach a4.
        let mv = resolve("R3k3/8/8/8/8/8/8/R3K3 w - - 0 1", "R1a4");
        assert_eq!(mv.from, sq("a1"));
        let mv = resolve("R3k3/8/8/8/8/8/8/R3K3 w - - 0 1", "R8a4");
        assert_eq!(mv.from, sq("a8"));
    }

    #[test]
    fn ambiguous_san_is_an_error() {
        let err = find_move(&mut board("4k3/8/8/8/8/4K3/8/R6R w - - 0 1"), "Rd1").unwrap_err();
        assert!(matches!(err, ChessError::AmbiguousMove { candidates: 2, .. }));
    }

    #[test]
    fn knight_file_disambiguation() {
        // Knights on b1 and f3 both reach d2.
        let fen = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
        let mv = resolve(fen, "Nbd2");
        assert_eq!(mv.from, sq("b1"));
        let mv = resolve(fen, "Nfd2");
        assert_eq!(mv.from, sq("f3"));
    }

    // -------------------------------------------------------------------
    // Castling
    // -------------------------------------------------------------------

    #[test]
    fn castle_short() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        for spelling in ["O-O", "0-0"] {
            let mv = resolve(fen, spelling);
            assert_eq!(mv.kind, MoveKind::Castle);
            assert_eq!(mv.to, sq("g1"));
        }
    }

    #[test]
    fn castle_long() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1";
        for spelling in ["O-O-O", "0-0-0"] {
            let mv = resolve(fen, spelling);
            assert_eq!(mv.kind, MoveKind::Castle);
            assert_eq!(mv.to, sq("c8"));
        }
    }

    #[test]
    fn castle_not_available() {
        assert!(find_move(&mut board(START), "O-O").is_err());
    }

    // -------------------------------------------------------------------
    // Suffixes
    // -------------------------------------------------------------------

    #[test]
    fn check_and_annotation_suffixes_stripped() {
        for san in ["Nf3+", "Nf3#", "Nf3!", "Nf3?", "Nf3!?"] {
            let mv = resolve(START, san);
            assert_eq!(mv.to, sq("f3"));
        }
    }

    // -------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------

    #[test]
    fn illegal_move_is_an_error() {
        assert!(matches!(
            find_move(&mut board(START), "Qh5"),
            Err(ChessError::IllegalMove { .. })
        ));
    }

    #[test]
    fn nonsense_is_an_error() {
        assert!(find_move(&mut board(START), "").is_err());
        assert!(find_move(&mut board(START), "e").is_err());
        assert!(find_move(&mut board(START), "z9").is_err());
        assert!(find_move(&mut board(START), "e8=X").is_err());
    }

    #[test]
    fn resolved_move_carries_piece_eaten_flag() {
        // Promotion with capture and check, then the king recaptures.
        let mut b = board("1nk5/P7/8/8/8/8/8/7K w - - 0 1");
        let promo = find_move(&mut b, "axb8=Q+").unwrap();
        assert_eq!(promo.kind, MoveKind::PromoteQueen);
        assert_eq!(promo.flags, MoveFlags::PIECE_EATEN);
        b.do_move(promo);
        assert!(b.is_in_check(crate::engine::types::Color::Black));

        let recapture = find_move(&mut b, "Kxb8").unwrap();
        assert!(recapture.flags.is_capture());
    }
}
