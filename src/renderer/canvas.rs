//! Canvas 2D projection of a session snapshot
//!
//! Pure drawing: nothing here feeds back into the simulation.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::{COLS, PREVIEW_BLOCK_SIZE, PREVIEW_CELLS, ROWS};
use crate::settings::BlockScale;
use crate::sim::{Color, Piece, Snapshot, XpPopup};

const COLOR_BACKGROUND: &str = "#0a0e27";
const COLOR_GRID: &str = "rgba(102, 126, 234, 0.1)";
const COLOR_BLOCK_BORDER: &str = "rgba(255, 255, 255, 0.3)";
const COLOR_GHOST_FILL: &str = "rgba(136, 136, 136, 0.2)";
const COLOR_GHOST_BORDER: &str = "rgba(136, 136, 136, 0.4)";
const COLOR_PAUSE_DIM: &str = "rgba(0, 0, 0, 0.7)";

/// Popups drift up by one cell every this many frames
const POPUP_RISE_FRAMES: f64 = 20.0;

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("not a 2d context"))
}

/// Draws the board canvas and the optional next-piece preview
pub struct CanvasRenderer {
    board_canvas: HtmlCanvasElement,
    board: CanvasRenderingContext2d,
    preview: Option<CanvasRenderingContext2d>,
    block_size: f64,
}

impl CanvasRenderer {
    pub fn new(
        board_canvas: HtmlCanvasElement,
        preview_canvas: Option<&HtmlCanvasElement>,
        scale: BlockScale,
    ) -> Result<Self, JsValue> {
        let board = context_2d(&board_canvas)?;
        let preview = match preview_canvas {
            Some(canvas) => {
                let edge = PREVIEW_BLOCK_SIZE * PREVIEW_CELLS;
                canvas.set_width(edge);
                canvas.set_height(edge);
                Some(context_2d(canvas)?)
            }
            None => None,
        };
        let mut renderer = Self {
            board_canvas,
            board,
            preview,
            block_size: 0.0,
        };
        renderer.set_scale(scale);
        Ok(renderer)
    }

    /// Resize the board canvas for a cell size preset
    pub fn set_scale(&mut self, scale: BlockScale) {
        let size = scale.block_size();
        self.block_size = f64::from(size);
        self.board_canvas.set_width(COLS as u32 * size);
        self.board_canvas.set_height(ROWS as u32 * size);
        log::info!("Board canvas set to {} px cells", size);
    }

    fn width(&self) -> f64 {
        f64::from(self.board_canvas.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.board_canvas.height())
    }

    pub fn render(&self, snap: &Snapshot<'_>) {
        let ctx = &self.board;
        ctx.set_fill_style_str(COLOR_BACKGROUND);
        ctx.fill_rect(0.0, 0.0, self.width(), self.height());
        self.draw_grid();

        for (row, cells) in snap.board.grid().iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if let Some(color) = cell {
                    self.draw_block(col as f64, row as f64, *color);
                }
            }
        }

        // The falling piece is hidden behind the pause overlay
        if !snap.paused {
            if let Some(ghost) = snap.visible_ghost() {
                for cell in ghost.cells() {
                    self.draw_ghost_block(f64::from(cell.x), f64::from(cell.y));
                }
            }
            for cell in snap.current.cells() {
                self.draw_block(f64::from(cell.x), f64::from(cell.y), snap.current.color);
            }
        }

        for popup in snap.popups {
            self.draw_popup(popup);
        }

        if snap.paused {
            self.draw_pause_overlay();
        }

        self.render_preview(snap.next);
    }

    fn draw_grid(&self) {
        let ctx = &self.board;
        ctx.set_stroke_style_str(COLOR_GRID);
        ctx.set_line_width(1.0);
        ctx.begin_path();
        for col in 0..=COLS {
            let x = col as f64 * self.block_size;
            ctx.move_to(x, 0.0);
            ctx.line_to(x, self.height());
        }
        for row in 0..=ROWS {
            let y = row as f64 * self.block_size;
            ctx.move_to(0.0, y);
            ctx.line_to(self.width(), y);
        }
        ctx.stroke();
    }

    fn draw_block(&self, col: f64, row: f64, color: Color) {
        fill_block(&self.board, col, row, self.block_size, &color.to_css());
    }

    fn draw_ghost_block(&self, col: f64, row: f64) {
        let ctx = &self.board;
        let size = self.block_size;
        ctx.set_fill_style_str(COLOR_GHOST_FILL);
        ctx.fill_rect(col * size + 1.0, row * size + 1.0, size - 2.0, size - 2.0);
        ctx.set_stroke_style_str(COLOR_GHOST_BORDER);
        ctx.set_line_width(1.0);
        ctx.stroke_rect(col * size + 1.0, row * size + 1.0, size - 2.0, size - 2.0);
    }

    fn draw_popup(&self, popup: &XpPopup) {
        let ctx = &self.board;
        let size = self.block_size;
        let x = f64::from(popup.col) * size + size / 2.0;
        let y = (f64::from(popup.row) - f64::from(popup.age) / POPUP_RISE_FRAMES) * size;
        ctx.set_fill_style_str(&format!("rgba(255, 215, 0, {})", popup.opacity()));
        ctx.set_font("bold 24px Arial");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let _ = ctx.fill_text(&format!("+{} XP", popup.xp), x, y);
    }

    fn draw_pause_overlay(&self) {
        let ctx = &self.board;
        ctx.set_fill_style_str(COLOR_PAUSE_DIM);
        ctx.fill_rect(0.0, 0.0, self.width(), self.height());
        ctx.set_fill_style_str("white");
        ctx.set_font("bold 40px Arial");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let _ = ctx.fill_text("PAUSED", self.width() / 2.0, self.height() / 2.0);
    }

    /// Next piece, centered in its own small canvas
    fn render_preview(&self, next: &Piece) {
        let Some(ctx) = &self.preview else {
            return;
        };
        let size = f64::from(PREVIEW_BLOCK_SIZE);
        let edge = size * f64::from(PREVIEW_CELLS);
        ctx.set_fill_style_str(COLOR_BACKGROUND);
        ctx.fill_rect(0.0, 0.0, edge, edge);

        let offset_col = (f64::from(PREVIEW_CELLS) - next.shape.width() as f64) / 2.0;
        let offset_row = (f64::from(PREVIEW_CELLS) - next.shape.height() as f64) / 2.0;
        let css = next.color.to_css();
        for cell in next.shape.offsets() {
            fill_block(
                ctx,
                offset_col + f64::from(cell.x),
                offset_row + f64::from(cell.y),
                size,
                &css,
            );
        }
    }
}

fn fill_block(ctx: &CanvasRenderingContext2d, col: f64, row: f64, size: f64, css: &str) {
    ctx.set_fill_style_str(css);
    ctx.fill_rect(col * size + 1.0, row * size + 1.0, size - 2.0, size - 2.0);
    ctx.set_stroke_style_str(COLOR_BLOCK_BORDER);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(col * size + 1.0, row * size + 1.0, size - 2.0, size - 2.0);
}
