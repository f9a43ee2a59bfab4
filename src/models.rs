/// A fully rendered response waiting to be written to a non-blocking socket.
#[derive(Debug)]
pub struct BufferedResponse {
    data: Vec<u8>,
    index: usize,
}

impl BufferedResponse {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, index: 0 }
    }

    pub fn peek(&self) -> &[u8] {
        &self.data[self.index..]
    }

    pub fn next(&mut self, n: usize) {
        self.index = (self.index + n).min(self.data.len());
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.data.len()
    }
}
