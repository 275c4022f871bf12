//! Adam optimizer over flat parameter groups.

/// Adam with bias correction. The learning rate is supplied per step so the
/// trainer, not the optimizer, owns it.
#[derive(Clone, Debug)]
pub struct Adam {
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: u32,
    m: Vec<Vec<f32>>,
    v: Vec<Vec<f32>>,
}

impl Adam {
    /// One moment buffer per parameter group, sized by `group_lens`.
    pub fn new(group_lens: &[usize]) -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            m: group_lens.iter().map(|&n| vec![0.0; n]).collect(),
            v: group_lens.iter().map(|&n| vec![0.0; n]).collect(),
        }
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u32 {
        self.t
    }

    /// Apply one update. `params[i]` and `grads[i]` must match group `i`.
    pub fn step(&mut self, lr: f32, params: &mut [&mut [f32]], grads: &[&[f32]]) {
        debug_assert_eq!(params.len(), self.m.len());
        debug_assert_eq!(grads.len(), self.m.len());

        self.t += 1;
        let t = self.t as i32;
        let lr_t = lr * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t));

        for (i, (p, g)) in params.iter_mut().zip(grads.iter()).enumerate() {
            for j in 0..p.len() {
                self.m[i][j] = self.beta1 * self.m[i][j] + (1.0 - self.beta1) * g[j];
                self.v[i][j] = self.beta2 * self.v[i][j] + (1.0 - self.beta2) * g[j].powi(2);
                p[j] -= lr_t * self.m[i][j] / (self.v[i][j].sqrt() + self.eps);
            }
        }
    }
}
