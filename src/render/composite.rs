use crate::foundation::error::{ReviewError, ReviewResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels, with `opacity` applied to the source.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Destination-out: keeps the destination where the source is transparent.
pub fn destination_out(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = mul_div255(u16::from(dst[i]), inv);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReviewResult<()> {
    check_pair(dst, src, "over_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub fn destination_out_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReviewResult<()> {
    check_pair(dst, src, "destination_out_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = destination_out([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Placement of a smaller premultiplied image inside a larger one.
#[derive(Clone, Copy, Debug)]
pub struct BlitParams {
    pub dst_width: u32,
    pub dst_height: u32,
    pub src_width: u32,
    pub src_height: u32,
    pub x: i64,
    pub y: i64,
    pub opacity: f32,
}

/// Source-over `src` onto `dst` at `(x, y)`, clipping whatever falls outside `dst`.
pub fn over_at(dst: &mut [u8], src: &[u8], params: BlitParams) -> ReviewResult<()> {
    let BlitParams {
        dst_width,
        dst_height,
        src_width,
        src_height,
        x,
        y,
        opacity,
    } = params;
    if dst.len() != dst_width as usize * dst_height as usize * 4
        || src.len() != src_width as usize * src_height as usize * 4
    {
        return Err(ReviewError::render(
            "over_at expects buffers matching width*height*4",
        ));
    }

    for sy in 0..i64::from(src_height) {
        let dy = y + sy;
        if dy < 0 || dy >= i64::from(dst_height) {
            continue;
        }
        for sx in 0..i64::from(src_width) {
            let dx = x + sx;
            if dx < 0 || dx >= i64::from(dst_width) {
                continue;
            }
            let si = ((sy as usize) * src_width as usize + sx as usize) * 4;
            let di = ((dy as usize) * dst_width as usize + dx as usize) * 4;
            let sp = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let dp = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(dp, sp, opacity));
        }
    }
    Ok(())
}

pub fn premultiply_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = mul_div255(u16::from(*c), a);
        }
    }
}

pub fn unpremultiply_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn check_pair(dst: &[u8], src: &[u8], op: &str) -> ReviewResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReviewError::render(format!(
            "{op} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
