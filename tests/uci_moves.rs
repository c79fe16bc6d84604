use cozy_chess::{Board, Piece};
use razorback::uci::{move_to_uci, pv_to_uci, uci_to_move};

#[test]
fn ordinary_moves_round_trip() {
    let board = Board::default();
    for uci in ["e2e4", "g1f3", "b1c3", "h2h3"] {
        let mv = uci_to_move(&board, uci).expect("legal");
        assert_eq!(move_to_uci(&board, mv), uci);
    }
}

#[test]
fn illegal_input_is_rejected() {
    let board = Board::default();
    assert!(uci_to_move(&board, "e2e5").is_none());
    assert!(uci_to_move(&board, "e7e5").is_none());
    assert!(uci_to_move(&board, "nonsense").is_none());
}

#[test]
fn castling_round_trips_in_gui_notation() {
    let board =
        Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1", false).unwrap();
    for uci in ["e1g1", "e1c1"] {
        let mv = uci_to_move(&board, uci).expect("castling is legal");
        assert_eq!(move_to_uci(&board, mv), uci);
    }
}

#[test]
fn promotions_keep_their_piece_suffix() {
    let board = Board::from_fen("8/2P5/8/8/8/8/k7/4K3 w - - 0 1", false).unwrap();
    for (uci, piece) in
        [("c7c8q", Piece::Queen), ("c7c8r", Piece::Rook), ("c7c8n", Piece::Knight)]
    {
        let mv = uci_to_move(&board, uci).expect("promotion is legal");
        assert_eq!(mv.promotion, Some(piece));
        assert_eq!(move_to_uci(&board, mv), uci);
    }
}

#[test]
fn pv_rendering_replays_the_line() {
    let board = Board::default();
    let pv = vec![
        uci_to_move(&board, "e2e4").unwrap(),
        // The next move is only legal after e2e4 is played.
        "e7e5".parse().unwrap(),
        "g1f3".parse().unwrap(),
    ];
    assert_eq!(pv_to_uci(&board, &pv), "e2e4 e7e5 g1f3");
}
