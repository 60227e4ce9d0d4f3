//! # chunk 编解码模块
//!
//! ## 设计思路
//!
//! chunk 是渲染层消费的“拉伸元数据”二进制块，布局必须逐字节一致。
//! 字节序为本机字节序：chunk 只在生成它的同一台机器上被消费。
//!
//! ## 布局
//!
//! ```text
//! [0]      was-serialized 标记（写 1，读时非 0 即可）
//! [1]      div_x 长度
//! [2]      div_y 长度
//! [3]      colors 长度
//! [4..12]  保留，两个 32 位 0
//! [12..28] padding：left, right, top, bottom
//! [28..32] 保留，一个 32 位 0
//! 之后     div_x、div_y、colors，各为 32 位
//! ```
//!
//! 保留字段的真实含义未知，只保证其存在且写 0，不赋予额外语义。

use crate::BubbleError;

use super::PaddingBox;

/// “不着色”哨兵值。
pub const NO_COLOR: u32 = 0x0000_0001;

/// 单段横向 + 单段竖向拉伸时的颜色表长度。
pub const COLOR_SIZE: usize = 9;

/// 头部之后、div 数组之前的 32 位字数量：2 保留 + 4 padding + 1 保留。
const FIXED_WORDS: usize = 2 + 4 + 1;

const WORD: usize = 4;

/// 拉伸元数据。
///
/// `div_x` / `div_y` 为成对的线段边界（长度恒为偶数），像素坐标，升序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub div_x: Vec<u32>,
    pub div_y: Vec<u32>,
    /// 像素坐标系下的四边内边距。
    pub padding: PaddingBox,
    pub colors: Vec<u32>,
}

impl Chunk {
    /// 以“全部不着色”的颜色表构建 chunk，并校验边界数组。
    pub fn new(div_x: Vec<u32>, div_y: Vec<u32>, padding: PaddingBox) -> Result<Self, BubbleError> {
        let chunk = Self {
            div_x,
            div_y,
            padding,
            colors: vec![NO_COLOR; COLOR_SIZE],
        };
        chunk.validate()?;
        Ok(chunk)
    }

    /// 校验计数可用单字节表示、边界成对且非递减。
    pub fn validate(&self) -> Result<(), BubbleError> {
        for (name, divs) in [("div_x", &self.div_x), ("div_y", &self.div_y)] {
            if divs.len() % 2 != 0 {
                return Err(BubbleError::MalformedChunk(format!(
                    "{} 长度必须为偶数：{}",
                    name,
                    divs.len()
                )));
            }
            if divs.windows(2).any(|pair| pair[0] > pair[1]) {
                return Err(BubbleError::MalformedChunk(format!(
                    "{} 边界不是升序：{:?}",
                    name, divs
                )));
            }
        }
        count_byte("div_x", self.div_x.len())?;
        count_byte("div_y", self.div_y.len())?;
        count_byte("colors", self.colors.len())?;
        Ok(())
    }

    /// 序列化后的字节数：`(1 + 2 + 4 + 1 + |div_x| + |div_y| + |colors|) * 4`。
    pub fn encoded_len(&self) -> usize {
        encoded_len_for(self.div_x.len(), self.div_y.len(), self.colors.len())
    }

    /// 编码为渲染层可直接消费的字节块。
    pub fn encode(&self) -> Result<Vec<u8>, BubbleError> {
        self.validate()?;

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(1);
        buf.push(self.div_x.len() as u8);
        buf.push(self.div_y.len() as u8);
        buf.push(self.colors.len() as u8);

        put_word(&mut buf, 0);
        put_word(&mut buf, 0);

        put_word(&mut buf, self.padding.left);
        put_word(&mut buf, self.padding.right);
        put_word(&mut buf, self.padding.top);
        put_word(&mut buf, self.padding.bottom);

        put_word(&mut buf, 0);

        for &value in self.div_x.iter().chain(&self.div_y).chain(&self.colors) {
            put_word(&mut buf, value);
        }

        debug_assert_eq!(buf.len(), self.encoded_len());
        Ok(buf)
    }

    /// 从字节块还原 chunk，是 `encode` 的逐字节逆操作。
    ///
    /// 多余的尾部字节被忽略。布局完整但 div 为奇数个或非升序的缓冲区同样被拒绝（`MalformedChunk`）。
    pub fn decode(bytes: &[u8]) -> Result<Self, BubbleError> {
        if bytes.len() < WORD {
            return Err(BubbleError::MalformedChunk(format!(
                "缓冲区长度 {} 不足以容纳头部",
                bytes.len()
            )));
        }
        if bytes[0] == 0 {
            return Err(BubbleError::MalformedChunk("was-serialized 标记为 0".to_string()));
        }

        let x_len = bytes[1] as usize;
        let y_len = bytes[2] as usize;
        let color_len = bytes[3] as usize;

        let expected = encoded_len_for(x_len, y_len, color_len);
        if bytes.len() < expected {
            return Err(BubbleError::MalformedChunk(format!(
                "缓冲区长度 {} 小于头部声明的 {}",
                bytes.len(),
                expected
            )));
        }

        let mut reader = WordReader::new(&bytes[WORD..]);
        reader.skip(2);
        let left = reader.next_word();
        let right = reader.next_word();
        let top = reader.next_word();
        let bottom = reader.next_word();
        reader.skip(1);

        let div_x = reader.take(x_len);
        let div_y = reader.take(y_len);
        let colors = reader.take(color_len);

        let chunk = Self {
            div_x,
            div_y,
            padding: PaddingBox::new(left, top, right, bottom),
            colors,
        };
        chunk.validate()?;
        Ok(chunk)
    }
}

fn encoded_len_for(x_len: usize, y_len: usize, color_len: usize) -> usize {
    (1 + FIXED_WORDS + x_len + y_len + color_len) * WORD
}

fn count_byte(name: &str, len: usize) -> Result<u8, BubbleError> {
    u8::try_from(len).map_err(|_| {
        BubbleError::MalformedChunk(format!("{} 长度 {} 超出单字节范围（最大 255）", name, len))
    })
}

fn put_word(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_ne_bytes());
}

/// 长度已在外部校验过的 32 位字读取器。
struct WordReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WordReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn skip(&mut self, words: usize) {
        self.pos += words * WORD;
    }

    fn next_word(&mut self) -> u32 {
        let mut word = [0u8; WORD];
        word.copy_from_slice(&self.bytes[self.pos..self.pos + WORD]);
        self.pos += WORD;
        u32::from_ne_bytes(word)
    }

    fn take(&mut self, count: usize) -> Vec<u32> {
        (0..count).map(|_| self.next_word()).collect()
    }
}
