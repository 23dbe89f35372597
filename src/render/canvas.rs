/// 0x00RRGGBB ピクセルのフレームバッファ
///
/// カメラ画像・描画先・ウィンドウ表示のすべてで同じ形式を使う。
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

/// 0x00RRGGBB にパック
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// 0x00RRGGBB を (r, g, b) に分解
pub fn unpack_rgb(color: u32) -> (u8, u8, u8) {
    ((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

impl FrameBuffer {
    /// 黒で塗りつぶしたキャンバス
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u32; width * height],
        }
    }

    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// 既存のピクセル列から作成。長さが合わなければ None
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// 同じサイズの黒キャンバス
    pub fn blank_like(&self) -> Self {
        Self::blank(self.width, self.height)
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
            Some(self.pixels[y as usize * self.width + x as usize])
        } else {
            None
        }
    }

    /// ピクセルをセット（境界チェック付き）
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
    }

    /// 円を描画（塗りつぶし）
    ///
    /// 走査はフレーム内に限る。距離の計算は i64 で行う。
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        if radius < 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let (cx, cy, r) = (cx as i64, cy as i64, radius as i64);
        let x_range = (cx - r).max(0)..=(cx + r).min(self.width as i64 - 1);
        let y_range = (cy - r).max(0)..=(cy + r).min(self.height as i64 - 1);

        for y in y_range {
            for x in x_range.clone() {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    self.pixels[y as usize * self.width + x as usize] = color;
                }
            }
        }
    }

    /// Bresenhamのアルゴリズムで線を描画
    ///
    /// thickness > 1 のときは各点に円を打って太らせる。
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let brush = (thickness - 1) / 2;

        let mut x = x0;
        let mut y = y0;

        loop {
            if brush > 0 {
                self.draw_circle(x, y, brush, color);
            } else {
                self.set_pixel(x, y, color);
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}
