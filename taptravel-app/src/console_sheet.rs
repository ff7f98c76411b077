use async_trait::async_trait;
use taptravel_core::payment::{PaymentSheet, SheetError, SheetSetup};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;

/// Payment sheet hosted in the terminal: shows the amount and asks the rider
/// to confirm. Card handling stays with the provider.
pub struct ConsolePaymentSheet<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    setup: Mutex<Option<SheetSetup>>,
}

impl ConsolePaymentSheet<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsolePaymentSheet<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            setup: Mutex::new(None),
        }
    }

    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    async fn write(&self, text: &str) -> Result<(), SheetError> {
        let mut output = self.output.lock().await;
        output
            .write_all(text.as_bytes())
            .await
            .map_err(|e| SheetError::failed(e.to_string()))?;
        output.flush().await.map_err(|e| SheetError::failed(e.to_string()))
    }
}

#[async_trait]
impl<R, W> PaymentSheet for ConsolePaymentSheet<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn init_payment_sheet(&self, setup: &SheetSetup) -> Result<(), SheetError> {
        tracing::debug!(customer = %setup.customer_id, amount = setup.amount, "Payment sheet prepared");
        *self.setup.lock().await = Some(setup.clone());
        Ok(())
    }

    async fn present_payment_sheet(&self) -> Result<(), SheetError> {
        let Some(setup) = self.setup.lock().await.clone() else {
            return Err(SheetError::failed("Payment sheet is not initialized"));
        };

        self.write(&format!(
            "{}: pay {} for your booking? [y/N] ",
            setup.merchant_display_name, setup.amount
        ))
        .await?;

        let mut line = String::new();
        let read = self
            .input
            .lock()
            .await
            .read_line(&mut line)
            .await
            .map_err(|e| SheetError::failed(e.to_string()))?;
        if read == 0 {
            return Err(SheetError::failed("No response from rider"));
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(()),
            _ => Err(SheetError::canceled()),
        }
    }
}
