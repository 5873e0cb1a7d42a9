use minesweeper_ai as ms;
use wasm_bindgen::prelude::*;

const PLAYING: u8 = 0;
const WON: u8 = 1;
const LOST: u8 = 2;

fn load(bts: &[u8]) -> Result<ms::Session, String> {
    ms::Session::deserialize(bts).map_err(|e| e.to_string())
}

fn status(session: &ms::Session) -> u8 {
    match session.game.game_state {
        ms::GameState::Playing => PLAYING,
        ms::GameState::Won => WON,
        ms::GameState::Lost => LOST,
    }
}

#[wasm_bindgen]
pub fn create_session(height: u8, width: u8, mines: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let config = ms::Config {
        height: height as usize,
        width: width as usize,
        mines: mines as usize,
        ..ms::Config::default()
    };
    let session = ms::Session::new(&config, &mut rand::rng()).map_err(|e| e.to_string())?;
    session.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn game_state(bts: Vec<u8>) -> Result<u8, String> {
    console_error_panic_hook::set_once();

    Ok(status(&load(&bts)?))
}

/// Lets the bot make one move. The last byte of the result is the game state.
#[wasm_bindgen]
pub fn step(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut session = load(&bts)?;
    session
        .step(&mut rand::rng())
        .map_err(|e| e.to_string())?;
    let mut xs = session.serialize().map_err(|e| e.to_string())?;
    xs.push(status(&session));
    Ok(xs)
}

/// Reveals a cell chosen by the user. The last byte of the result is the game state.
#[wasm_bindgen]
pub fn reveal(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut session = load(&bts)?;
    session
        .reveal(ms::Cell::new(row, col))
        .map_err(|e| e.to_string())?;
    let mut xs = session.serialize().map_err(|e| e.to_string())?;
    xs.push(status(&session));
    Ok(xs)
}

/// Row-major cell view: the count for revealed cells, -1 hidden, -2 a
/// proven mine, -3 proven safe but not yet revealed.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let session = load(&bts)?;
    let kb = session.engine.knowledge();
    Ok(session
        .game
        .bounds()
        .cells()
        .map(|cell| match session.game.revealed(cell) {
            Some(n) => n as i8,
            None if kb.known_mines().contains(&cell) => -2,
            None if kb.known_safe().contains(&cell) => -3,
            None => -1,
        })
        .collect())
}
