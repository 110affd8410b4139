use ai_4096::engine::Board;
use ai_4096::expectimax::Searcher;
use ai_4096::tables;

fn main() {
    env_logger::init();
    tables::init();
    let mut searcher = Searcher::new();
    let mut rng = rand::thread_rng();
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    let mut score = 0u64;
    let mut move_count = 0u64;
    println!("{}", board);
    while let Some(dir) = searcher.best_move(board) {
        let outcome = board.shift(dir);
        score += outcome.points as u64;
        board = outcome.board.with_random_tile(&mut rng);
        move_count += 1;
        println!("{}", board);
    }
    println!(
        "Moves made: {}, score: {}, highest tile: {}",
        move_count,
        score,
        board.highest_tile()
    );
}
